use anyhow::Result;
use log::{info, warn};
use std::sync::Arc;

use myy_vout::core::{OutputConfig, Rect, Subtitle, SubtitleRect, VideoFrame};
use myy_vout::output::{BackendKind, MemoryDisplay, OverlayOutput, VideoOutput};
use myy_vout::SoftScaler;

const FRAMEBUFFER_SIZE: (u32, u32) = (640, 360);
const PICTURE_SIZE: (u32, u32) = (352, 288);
const FRAME_COUNT: i64 = 25;

/// 生成一帧移动的亮度渐变（NV12，需要经过转换器）
fn test_pattern(index: i64) -> Result<VideoFrame> {
    let (width, height) = (PICTURE_SIZE.0 * 2, PICTURE_SIZE.1 * 2);
    let mut frame = VideoFrame::alloc(myy_vout::core::PixelFormat::NV12, width, height, 32)?;
    let stride = frame.planes[0].stride;
    for (y, row) in frame.planes[0].data.chunks_mut(stride).enumerate() {
        for (x, px) in row.iter_mut().take(width as usize).enumerate() {
            *px = (16 + (x + y + index as usize * 8) % 220) as u8;
        }
    }
    frame.planes[1].data.fill(128);
    frame.pts = index * 40;
    frame.duration = 40;
    Ok(frame)
}

fn caption() -> Subtitle {
    let (w, h) = (120u32, 16u32);
    let pixels = (0..h)
        .flat_map(|y| (0..w).map(move |x| u8::from(y == 0 || y == h - 1 || x == 0 || x == w - 1) + 1))
        .collect();
    Subtitle {
        pts: 0,
        end_pts: FRAME_COUNT * 40,
        rects: vec![SubtitleRect {
            x: ((PICTURE_SIZE.0 - w) / 2) as i32,
            y: (PICTURE_SIZE.1 - h - 16) as i32,
            w,
            h,
            pixels,
            linesize: w as usize,
            palette: vec![[0, 0, 0, 0], [235, 128, 128, 192], [16, 128, 128, 255]],
        }],
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("🎬 视频输出探测工具启动");

    let config = match std::env::args().nth(1) {
        Some(path) => OutputConfig::load(&path)?,
        None => OutputConfig::default(),
    };
    config.validate()?;
    info!("配置: {:?}", config);

    if config.backend == BackendKind::Gl {
        warn!("没有可用的 GL 上下文，改用{}后端", BackendKind::Overlay.name());
    }

    let display = MemoryDisplay::new(FRAMEBUFFER_SIZE.0, FRAMEBUFFER_SIZE.1)
        .with_pitch_align(config.overlay_pitch_align);
    let framebuffer = display.framebuffer();
    let mut output = OverlayOutput::new(display);
    info!("表面标志: {:?}", <OverlayOutput<MemoryDisplay> as VideoOutput>::SURFACE_FLAGS);

    let mut texture = Some(output.alloc_texture(PICTURE_SIZE.0, PICTURE_SIZE.1)?);
    let mut scaler = SoftScaler;
    let subtitle = caption();
    let target = Rect::new(0, 0, FRAMEBUFFER_SIZE.0, FRAMEBUFFER_SIZE.1);

    if let Some(texture) = texture.as_mut() {
        for index in 0..FRAME_COUNT {
            let frame = Arc::new(test_pattern(index)?);
            output.fill_texture(texture, &frame, Some(&mut scaler))?;
            if frame.pts >= subtitle.pts && frame.pts < subtitle.end_pts {
                output.blend_texture(texture, &subtitle)?;
            }
            output.display_texture(texture, target)?;
        }
    }

    output.free_texture(&mut texture);

    let fb = framebuffer.lock();
    let center = fb.pixel(fb.width / 2, fb.height / 2);
    info!(
        "✅ 完成: 显示 {} 帧, 中心像素 {:?}, 剩余 Overlay {}",
        fb.frames_presented,
        center,
        output.display().live_overlays()
    );

    Ok(())
}
