//! 方向梯度直方图 (HOG) 特征.
//!
//! 整个窗口作为单一 cell, 8 个方向 bin, 输入先做开方变换以抑制
//! 光照影响, 直方图经 L2-Hys 归一化后取平均, 缩减为单个特征.

use itertools::izip;
use ndarray::{Array2, Array3, ArrayView2};

use crate::consts::HOG_ORIENTATIONS;
use crate::data::swin::sliding_window;

/// 特征名列表.
pub fn names() -> Vec<String> {
    vec!["hog".to_owned()]
}

/// 计算一个窗口的 HOG 特征.
pub fn feats(win: ArrayView2<f32>) -> f32 {
    let (h, w) = win.dim();
    // 参数图取值非负; 开方变换.
    let img = win.mapv(|v| (v.max(0.0) as f64).sqrt());

    // 中心差分梯度, 边界行列记 0.
    let mut g_row = Array2::<f64>::zeros((h, w));
    let mut g_col = Array2::<f64>::zeros((h, w));
    for i in 1..h.saturating_sub(1) {
        for j in 0..w {
            g_row[(i, j)] = img[(i + 1, j)] - img[(i - 1, j)];
        }
    }
    for i in 0..h {
        for j in 1..w.saturating_sub(1) {
            g_col[(i, j)] = img[(i, j + 1)] - img[(i, j - 1)];
        }
    }

    // 无符号方向 [0, 180), 按幅值加权.
    let mut hist = [0.0f64; HOG_ORIENTATIONS];
    let bin_width = 180.0 / HOG_ORIENTATIONS as f64;
    for (&gr, &gc) in izip!(g_row.iter(), g_col.iter()) {
        let mag = gr.hypot(gc);
        if mag == 0.0 {
            continue;
        }
        let angle = gr.atan2(gc).to_degrees().rem_euclid(180.0);
        let bin = ((angle / bin_width) as usize).min(HOG_ORIENTATIONS - 1);
        hist[bin] += mag;
    }

    // L2-Hys: 归一化, 截断到 0.2, 再归一化.
    let eps = 1e-5;
    let norm = hist.iter().map(|v| v * v).sum::<f64>().sqrt();
    let mut blk = hist.map(|v| (v / (norm * norm + eps * eps).sqrt()).min(0.2));
    let norm2 = blk.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm2 > 0.0 {
        for v in &mut blk {
            *v /= (norm2 * norm2 + eps * eps).sqrt();
        }
    }

    (blk.iter().sum::<f64>() / HOG_ORIENTATIONS as f64) as f32
}

/// HOG 特征的滑动窗口特征图. 返回形状为 `(H, W, 1)` 的数组,
/// 未计算的位置保持 0 填充.
pub fn map<'a>(sli: ArrayView2<'a, f32>, size: usize, mask: ArrayView2<'a, bool>) -> Array3<f32> {
    let (h, w) = sli.dim();
    let mut out = Array3::zeros((h, w, 1));
    for ((i, j), win) in sliding_window(sli, size, Some(mask)) {
        out[(i, j, 0)] = feats(win);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::feats;
    use ndarray::Array2;

    #[test]
    fn test_constant_window_no_gradient() {
        let win = Array2::<f32>::from_elem((5, 5), 4.0);
        assert_eq!(feats(win.view()), 0.0);
    }

    #[test]
    fn test_ramp_window() {
        // 水平渐变: 梯度集中于单一方向, 直方图非零且有界.
        let win = Array2::from_shape_fn((5, 5), |(_, j)| (j * j) as f32);
        let f = feats(win.view());
        assert!(f > 0.0);
        assert!(f <= 0.2);
    }
}
