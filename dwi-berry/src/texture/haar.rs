//! Haar 小波特征.
//!
//! 对窗口做单层 2D Haar 分解, 以四个子带 (LL/LH/HL/HH) 系数绝对值的
//! 平均值作为特征. 奇数边长的窗口以复制末行/末列的方式补齐到偶数.

use itertools::izip;
use ndarray::{s, Array3, ArrayView2};

use crate::data::swin::sliding_window;

/// 子带顺序.
const BANDS: [&str; 4] = ["ll", "lh", "hl", "hh"];

/// 特征名列表, 与 [`feats`] 的输出顺序一致.
pub fn names() -> Vec<String> {
    BANDS.iter().map(|b| format!("haar({b})")).collect()
}

/// 计算一个窗口的四个 Haar 子带特征.
pub fn feats(win: ArrayView2<f32>) -> [f32; 4] {
    let (h, w) = win.dim();
    // 奇数边长补齐: 越界处复制最后一行/列.
    let at = |i: usize, j: usize| win[(i.min(h - 1), j.min(w - 1))] as f64;
    let (h2, w2) = ((h + 1) / 2, (w + 1) / 2);

    let mut acc = [0.0f64; 4];
    for bi in 0..h2 {
        for bj in 0..w2 {
            let (i, j) = (2 * bi, 2 * bj);
            let (a, b) = (at(i, j), at(i, j + 1));
            let (c, d) = (at(i + 1, j), at(i + 1, j + 1));
            // 正交归一 Haar 基: 系数为四像素的 ±1 组合除以 2.
            acc[0] += ((a + b + c + d) / 2.0).abs();
            acc[1] += ((a - b + c - d) / 2.0).abs();
            acc[2] += ((a + b - c - d) / 2.0).abs();
            acc[3] += ((a - b - c + d) / 2.0).abs();
        }
    }
    let n = (h2 * w2) as f64;
    acc.map(|v| (v / n) as f32)
}

/// Haar 特征的滑动窗口特征图. 返回形状为 `(H, W, 4)` 的数组,
/// 未计算的位置保持 0 填充.
pub fn map<'a>(sli: ArrayView2<'a, f32>, size: usize, mask: ArrayView2<'a, bool>) -> Array3<f32> {
    let (h, w) = sli.dim();
    let mut out = Array3::zeros((h, w, BANDS.len()));
    for ((i, j), win) in sliding_window(sli, size, Some(mask)) {
        for (dst, v) in izip!(out.slice_mut(s![i, j, ..]), feats(win)) {
            *dst = v;
        }
    }
    out
}
