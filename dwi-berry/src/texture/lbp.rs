//! 局部二值模式 (LBP) 频率特征.
//!
//! 先对整张切片做旋转不变 uniform LBP 变换, 再对每个滑动窗口统计
//! 各编码出现的频率. uniform 模式的编码为圆周上 1 的个数 (0..=P),
//! 非 uniform 模式统一归入编码 P + 1, 共 P + 2 个编码.

use std::f64::consts::PI;

use ndarray::{Array2, Array3, ArrayView2};

use crate::consts::LBP_NEIGHBOURS;
use crate::data::swin::sliding_window;

/// 编码个数.
const N_BINS: usize = LBP_NEIGHBOURS + 2;

/// 特征名列表. `radius` 为采样圆半径 (像素).
pub fn names(radius: usize) -> Vec<String> {
    (0..N_BINS).map(|i| format!("lbp({radius},{i})")).collect()
}

/// 双线性插值采样, 坐标越界时夹取到边界.
fn bilinear(sli: ArrayView2<f32>, y: f64, x: f64) -> f32 {
    let (h, w) = sli.dim();
    let clamp = |v: f64, n: usize| v.clamp(0.0, (n - 1) as f64);
    let (y, x) = (clamp(y, h), clamp(x, w));
    let (y0, x0) = (y.floor() as usize, x.floor() as usize);
    let (y1, x1) = ((y0 + 1).min(h - 1), (x0 + 1).min(w - 1));
    let (fy, fx) = ((y - y0 as f64) as f32, (x - x0 as f64) as f32);
    let top = sli[(y0, x0)] * (1.0 - fx) + sli[(y0, x1)] * fx;
    let bot = sli[(y1, x0)] * (1.0 - fx) + sli[(y1, x1)] * fx;
    top * (1.0 - fy) + bot * fy
}

/// 对整张切片计算 uniform LBP 编码图.
pub fn transform(sli: ArrayView2<f32>, radius: f64) -> Array2<u8> {
    let p = LBP_NEIGHBOURS;
    Array2::from_shape_fn(sli.dim(), |(i, j)| {
        let center = sli[(i, j)];
        let mut bits = [false; LBP_NEIGHBOURS];
        for (k, bit) in bits.iter_mut().enumerate() {
            let angle = 2.0 * PI * k as f64 / p as f64;
            let y = i as f64 - radius * angle.sin();
            let x = j as f64 + radius * angle.cos();
            *bit = bilinear(sli, y, x) >= center;
        }
        // 圆周上 0-1 跳变至多两次才算 uniform.
        let transitions = (0..p).filter(|&k| bits[k] != bits[(k + 1) % p]).count();
        if transitions <= 2 {
            bits.iter().filter(|&&b| b).count() as u8
        } else {
            (p + 1) as u8
        }
    })
}

/// LBP 频率的滑动窗口特征图. 采样半径为 `size / 2`.
/// 返回形状为 `(H, W, 10)` 的数组, 未计算的位置保持 0 填充.
pub fn map(sli: ArrayView2<f32>, size: usize, mask: ArrayView2<bool>) -> Array3<f32> {
    let radius = size / 2;
    let codes = transform(sli, radius as f64);
    let (h, w) = sli.dim();
    let mut out = Array3::zeros((h, w, N_BINS));
    for ((i, j), win) in sliding_window(codes.view(), size, Some(mask.view())) {
        let total = win.len() as f32;
        let mut hist = [0f32; N_BINS];
        for &c in win.iter() {
            hist[c as usize] += 1.0;
        }
        for (b, cnt) in hist.into_iter().enumerate() {
            out[(i, j, b)] = cnt / total;
        }
    }
    out
}
