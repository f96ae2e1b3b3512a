//! 字幕叠加
//!
//! 后端的 `blend_texture` 只负责准备一个可写的平面视图，然后按顺序对
//! 字幕的每个矩形调用 [`Compositor::blend_rect`]。

use crate::core::{chroma_extent, PlanarViewMut, SubtitleRect};

/// 把一个字幕矩形混合到一帧平面图像上（原地修改，不分配内存）
pub trait Compositor {
    fn blend_rect(&self, dst: &mut PlanarViewMut<'_>, rect: &SubtitleRect);
}

/// 调色板 YUVA 字幕的 alpha 混合
///
/// 亮度逐像素混合；色度按 2x2 块取平均 alpha。矩形超出画面的部分被裁掉。
#[derive(Debug, Clone, Copy, Default)]
pub struct AlphaBlend;

fn mix(dst: u8, src: u8, alpha: u32) -> u8 {
    ((dst as u32 * (255 - alpha) + src as u32 * alpha + 127) / 255) as u8
}

impl Compositor for AlphaBlend {
    fn blend_rect(&self, dst: &mut PlanarViewMut<'_>, rect: &SubtitleRect) {
        let x0 = rect.x.max(0) as i64;
        let y0 = rect.y.max(0) as i64;
        let x1 = (rect.x as i64 + rect.w as i64).min(dst.width as i64);
        let y1 = (rect.y as i64 + rect.h as i64).min(dst.height as i64);
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        let sample = |x: i64, y: i64| -> Option<[u8; 4]> {
            if x < x0 || x >= x1 || y < y0 || y >= y1 {
                return None;
            }
            rect.sample((x - rect.x as i64) as usize, (y - rect.y as i64) as usize)
        };

        // 亮度
        let luma_stride = dst.strides[0];
        for y in y0..y1 {
            for x in x0..x1 {
                let Some([sy, _, _, a]) = sample(x, y) else {
                    continue;
                };
                if let Some(px) = dst.planes[0].get_mut(y as usize * luma_stride + x as usize) {
                    *px = mix(*px, sy, a as u32);
                }
            }
        }

        // 色度：每个色度像素覆盖 2x2 个亮度像素，画面外/矩形外的位置按 alpha=0 计
        let cx1 = chroma_extent(x1 as usize) as i64;
        let cy1 = chroma_extent(y1 as usize) as i64;
        for cy in y0 / 2..cy1 {
            for cx in x0 / 2..cx1 {
                let (mut alpha_sum, mut u_sum, mut v_sum) = (0u32, 0u32, 0u32);
                for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                    if let Some([_, su, sv, a]) = sample(cx * 2 + dx, cy * 2 + dy) {
                        alpha_sum += a as u32;
                        u_sum += su as u32 * a as u32;
                        v_sum += sv as u32 * a as u32;
                    }
                }
                if alpha_sum == 0 {
                    continue;
                }

                let alpha = (alpha_sum + 2) / 4;
                let u = ((u_sum + alpha_sum / 2) / alpha_sum) as u8;
                let v = ((v_sum + alpha_sum / 2) / alpha_sum) as u8;
                for (plane, value) in [(1, u), (2, v)] {
                    let offset = cy as usize * dst.strides[plane] + cx as usize;
                    if let Some(px) = dst.planes[plane].get_mut(offset) {
                        *px = mix(*px, value, alpha);
                    }
                }
            }
        }
    }
}
