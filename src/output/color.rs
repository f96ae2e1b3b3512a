//! YUV（TV 范围）到 RGB（全范围）的转换系数
//!
//! 系数矩阵按行存放：第 0~2 行分别乘以 Y、U、V，第 3 行是偏移。
//! GPU 片段着色器和内存显示子系统用的是同一组常量。

/// 高于这个高度的画面按高清（BT.709）处理
pub const HD_HEIGHT_THRESHOLD: u32 = 576;

/// 4x4 系数矩阵
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorMatrix(pub [[f32; 4]; 4]);

impl ColorMatrix {
    pub fn rows(&self) -> &[[f32; 4]; 4] {
        &self.0
    }

    /// 在 CPU 上执行与片段着色器相同的乘加：
    /// `rgb = y*c0 + c3; rgb += u*c1; rgb += v*c2`，输入输出都是 0.0~1.0
    pub fn apply(&self, yuv: [f32; 3]) -> [f32; 3] {
        let [c0, c1, c2, c3] = self.0;
        let mut rgb = [0.0; 3];
        for (i, out) in rgb.iter_mut().enumerate() {
            let tmp = yuv[0] * c0[i] + c3[i];
            let tmp = yuv[1] * c1[i] + tmp;
            *out = yuv[2] * c2[i] + tmp;
        }
        rgb
    }
}

pub const BT601_TV2FULL: ColorMatrix = ColorMatrix([
    [1.164383561643836, 1.164383561643836, 1.164383561643836, 0.0],
    [0.0, -0.391762290094914, 2.017232142857142, 0.0],
    [1.596026785714286, -0.812967647237771, 0.0, 0.0],
    [-0.874202217873451, 0.531667823499146, -1.085630789302022, 0.0],
]);

pub const BT709_TV2FULL: ColorMatrix = ColorMatrix([
    [1.164383561643836, 1.164383561643836, 1.164383561643836, 0.0],
    [0.0, -0.213248614273730, 2.112401785714286, 0.0],
    [1.792741071428571, -0.532909328559444, 0.0, 0.0],
    [-0.972945075016308, 0.301482665475862, -1.133402217873451, 0.0],
]);

/// 色彩矩阵类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMatrixKind {
    /// 标清
    Bt601,
    /// 高清
    Bt709,
}

impl ColorMatrixKind {
    /// 根据画面高度选择矩阵（固定阈值 576 行）
    pub fn for_height(height: u32) -> Self {
        if height > HD_HEIGHT_THRESHOLD {
            ColorMatrixKind::Bt709
        } else {
            ColorMatrixKind::Bt601
        }
    }

    pub fn matrix(&self) -> &'static ColorMatrix {
        match self {
            ColorMatrixKind::Bt601 => &BT601_TV2FULL,
            ColorMatrixKind::Bt709 => &BT709_TV2FULL,
        }
    }

    /// 8 位 YUV 转 8 位 RGB（带截断）
    pub fn convert_u8(&self, y: u8, u: u8, v: u8) -> [u8; 3] {
        let rgb = self
            .matrix()
            .apply([y as f32 / 255.0, u as f32 / 255.0, v as f32 / 255.0]);
        rgb.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
    }
}
