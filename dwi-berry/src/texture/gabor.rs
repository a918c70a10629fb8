//! Gabor 滤波特征.
//!
//! 滤波器组由 sigma 与频率两组参数张成, 每种组合在四个方向上滤波,
//! 统计量对方向取平均以获得旋转不变性. 窗口尺寸即波长 1, 频率为
//! 波长的倒数.

use std::f64::consts::PI;

use itertools::izip;
use ndarray::{s, Array2, Array3, ArrayView2};

use crate::consts::{GABOR_FREQS, GABOR_SIGMAS};
use crate::data::swin::sliding_window;

/// 每种 (sigma, 频率) 组合输出的统计量.
const STATS: [&str; 4] = ["mean", "var", "absmean", "mag"];

/// 特征个数.
const N_FEATS: usize = GABOR_SIGMAS.len() * GABOR_FREQS.len() * STATS.len();

/// 滤波方向个数.
const N_THETAS: usize = 4;

/// 特征名列表, 与 [`feats`] 的输出顺序一致.
pub fn names() -> Vec<String> {
    let mut out = Vec::with_capacity(N_FEATS);
    for s in GABOR_SIGMAS {
        for f in GABOR_FREQS {
            for stat in STATS {
                out.push(format!("gabor({s},{f},{stat})"));
            }
        }
    }
    out
}

/// 构建复 Gabor 核的实部与虚部. 核的半径取 3 个标准差.
fn kernel(frequency: f64, theta: f64, sigma: f64) -> (Array2<f64>, Array2<f64>) {
    let half = (3.0 * sigma).ceil().max(1.0) as isize;
    let n = (2 * half + 1) as usize;
    let norm = 1.0 / (2.0 * PI * sigma * sigma);
    let (mut re, mut im) = (Array2::zeros((n, n)), Array2::zeros((n, n)));
    for dy in -half..=half {
        for dx in -half..=half {
            let (x, y) = (dx as f64, dy as f64);
            let rotx = x * theta.cos() + y * theta.sin();
            let roty = -x * theta.sin() + y * theta.cos();
            let g = norm * (-0.5 * (rotx * rotx + roty * roty) / (sigma * sigma)).exp();
            let phase = 2.0 * PI * frequency * rotx;
            let idx = ((dy + half) as usize, (dx + half) as usize);
            re[idx] = g * phase.cos();
            im[idx] = g * phase.sin();
        }
    }
    (re, im)
}

/// 反射边界索引 (half-sample symmetric).
fn reflect(mut i: isize, n: usize) -> usize {
    let n = n as isize;
    loop {
        if i < 0 {
            i = -i - 1;
        } else if i >= n {
            i = 2 * n - i - 1;
        } else {
            return i as usize;
        }
    }
}

/// 以反射边界对 `win` 做 2D 滤波.
fn filter(win: ArrayView2<f32>, k: &Array2<f64>) -> Array2<f64> {
    let (h, w) = win.dim();
    let half = (k.dim().0 / 2) as isize;
    Array2::from_shape_fn((h, w), |(i, j)| {
        let mut acc = 0.0;
        for ((di, dj), &kv) in k.indexed_iter() {
            let y = reflect(i as isize + di as isize - half, h);
            let x = reflect(j as isize + dj as isize - half, w);
            acc += kv * win[(y, x)] as f64;
        }
        acc
    })
}

/// 计算一个窗口的全部 Gabor 特征, 顺序与 [`names`] 一致.
pub fn feats(win: ArrayView2<f32>) -> Vec<f32> {
    // acc[(sigma, 频率, 统计量)] = 四个方向的统计量之和.
    let mut acc = vec![0.0f64; N_FEATS];
    for t in 0..N_THETAS {
        let theta = PI / 4.0 * t as f64;
        for (si, sigma) in GABOR_SIGMAS.into_iter().enumerate() {
            for (fi, freq) in GABOR_FREQS.into_iter().enumerate() {
                let (kre, kim) = kernel(freq, theta, sigma);
                let re = filter(win, &kre);
                let im = filter(win, &kim);

                let n = re.len() as f64;
                let mean = re.sum() / n;
                let var = re.iter().map(|&v| (v - mean).powi(2)).sum::<f64>() / n;
                let absmean = re.iter().map(|&v| v.abs()).sum::<f64>() / n;
                let mag = izip!(re.iter(), im.iter())
                    .map(|(&a, &b)| (a * a + b * b).sqrt())
                    .sum::<f64>()
                    / n;

                let base = (si * GABOR_FREQS.len() + fi) * STATS.len();
                for (slot, v) in izip!(&mut acc[base..base + 4], [mean, var, absmean, mag]) {
                    *slot += v;
                }
            }
        }
    }
    acc.into_iter()
        .map(|v| (v / N_THETAS as f64) as f32)
        .collect()
}

/// Gabor 特征的滑动窗口特征图.
/// 返回形状为 `(H, W, 48)` 的数组, 未计算的位置保持 0 填充.
pub fn map<'a>(sli: ArrayView2<'a, f32>, size: usize, mask: ArrayView2<'a, bool>) -> Array3<f32> {
    let (h, w) = sli.dim();
    let mut out = Array3::zeros((h, w, N_FEATS));
    for ((i, j), win) in sliding_window(sli, size, Some(mask)) {
        for (dst, v) in izip!(out.slice_mut(s![i, j, ..]), feats(win)) {
            *dst = v;
        }
    }
    out
}
