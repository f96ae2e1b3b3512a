//! 显示子系统与 Overlay 表面的抽象

use crate::core::{PlanarViewMut, Rect, Result};

/// Overlay 的平面布局
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayFormat {
    /// Y, V, U
    Yv12,
    /// Y, U, V
    Iyuv,
}

impl OverlayFormat {
    /// Y/U/V 分量各自存放在第几个平面
    pub const fn storage_order(&self) -> [usize; 3] {
        match self {
            OverlayFormat::Yv12 => [0, 2, 1],
            OverlayFormat::Iyuv => [0, 1, 2],
        }
    }
}

/// 显示子系统分配的 Overlay 表面
pub trait OverlaySurface {
    fn format(&self) -> OverlayFormat;
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    /// 按存储顺序的每平面行跨度
    fn pitches(&self) -> [usize; 3];
    /// 按存储顺序的每平面起始位置（同一地址空间内的字节偏移）
    fn plane_origins(&self) -> [usize; 3];
    /// 获取对 Overlay 内存的独占访问
    fn lock(&mut self) -> Result<()>;
    fn unlock(&mut self);
    /// 按存储顺序的平面内存，只能在 lock/unlock 之间访问
    fn planes_mut(&mut self) -> [&mut [u8]; 3];
}

/// 窗口/显示子系统提供的 Overlay 原语
pub trait DisplaySubsystem {
    type Surface: OverlaySurface;

    /// 申请 Overlay；实际得到的表面可能比请求的小，调用方负责校验
    fn create_overlay(&mut self, width: u32, height: u32, format: OverlayFormat) -> Option<Self::Surface>;
    fn free_overlay(&mut self, surface: Self::Surface);
    /// 把 Overlay 内容缩放显示到目标矩形
    fn display_overlay(&mut self, surface: &mut Self::Surface, rect: Rect) -> Result<()>;
}

/// Overlay 锁的作用域守卫，离开作用域时自动解锁
pub struct OverlayLock<'a, S: OverlaySurface> {
    surface: &'a mut S,
}

impl<'a, S: OverlaySurface> OverlayLock<'a, S> {
    pub fn acquire(surface: &'a mut S) -> Result<Self> {
        surface.lock()?;
        Ok(Self { surface })
    }

    /// 以 Y、U、V 顺序暴露 `width x height` 的画面
    pub fn picture(&mut self, width: u32, height: u32) -> PlanarViewMut<'_> {
        let [y, u, v] = self.surface.format().storage_order();
        let pitches = self.surface.pitches();
        let mut planes = self.surface.planes_mut().map(Some);

        // storage_order 是一个排列，每个平面只会被取一次
        let mut take = |index: usize| planes[index].take().unwrap_or_default();
        let (plane_y, plane_u, plane_v) = (take(y), take(u), take(v));

        PlanarViewMut {
            width,
            height,
            planes: [plane_y, plane_u, plane_v],
            strides: [pitches[y], pitches[u], pitches[v]],
        }
    }
}

impl<S: OverlaySurface> Drop for OverlayLock<'_, S> {
    fn drop(&mut self) {
        self.surface.unlock();
    }
}
