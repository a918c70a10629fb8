//! 特征图切片的持久化存储.

use std::path::Path;

use image::ImageResult;
use ndarray::ArrayView2;

use super::window::GrayWindow;
use crate::consts::gray::BLACK;

/// 按照 **可视化友好** 模式将一张特征图切片保存为灰度 PNG.
///
/// `sli` 为特征图某一特征通道的某层水平切片; 像素值经 `gw`
/// 映射到 8-bit 灰度. NaN 代表未被选中的背景体素, 渲染为黑色.
pub fn save_feat_slice<P: AsRef<Path>>(
    sli: ArrayView2<f32>,
    gw: &GrayWindow,
    path: P,
) -> ImageResult<()> {
    let (height, width) = sli.dim();
    let mut buf = image::GrayImage::new(width as u32, height as u32);
    for ((h, w), &pix) in sli.indexed_iter() {
        // 背景 (NaN) 为黑色.
        let gray = gw.eval8(pix).unwrap_or(BLACK);
        buf.put_pixel(w as u32, h as u32, image::Luma([gray]));
    }
    buf.save(path)
}
