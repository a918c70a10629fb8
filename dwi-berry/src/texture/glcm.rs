//! 灰度共生矩阵 (GLCM) 特征.
//!
//! 共生矩阵在四个方向 (0°, 45°, 90°, 135°) 上对称累计并归一化,
//! 特征值对方向取平均以获得旋转不变性; 每种属性在若干像素对距离上
//! 分别计算, 并额外给出跨距离的平均值.

use std::f64::consts::PI;

use itertools::izip;
use ndarray::{s, Array2, Array3, ArrayView2};

use crate::consts::GLCM_DISTANCES;
use crate::data::swin::sliding_window;
use crate::data::window::GrayWindow;
use crate::data::mask::bounding_box_2d;

/// GLCM 属性顺序.
const PROPS: [&str; 6] = [
    "contrast",
    "dissimilarity",
    "homogeneity",
    "energy",
    "correlation",
    "ASM",
];

/// 特征个数: 每种属性在各距离上取值, 外加跨距离平均.
const N_FEATS: usize = PROPS.len() * (GLCM_DISTANCES.len() + 1);

/// 特征名列表, 与 [`props`] 的输出顺序一致.
pub fn names() -> Vec<String> {
    let mut out = Vec::with_capacity(N_FEATS);
    for p in PROPS {
        for d in GLCM_DISTANCES {
            out.push(format!("glcm({p},{d})"));
        }
        out.push(format!("glcm({p},avg)"));
    }
    out
}

/// 距离为 `d` 时四个方向的 (行, 列) 偏移.
fn offsets(d: usize) -> [(isize, isize); 4] {
    let df = d as f64;
    [0.0, PI / 4.0, PI / 2.0, 3.0 * PI / 4.0]
        .map(|a| ((df * a.sin()).round() as isize, (df * a.cos()).round() as isize))
}

/// 沿偏移 `(dr, dc)` 累计对称共生矩阵并归一化.
///
/// `ignore_zeros` 为 `true` 且窗口最小灰度级为 0 时, 丢弃灰度级 0
/// 的全部信息 (0 代表被裁剪掉的背景).
fn comatrix(win: ArrayView2<u8>, (dr, dc): (isize, isize), ignore_zeros: bool) -> Array2<f64> {
    let levels = win.iter().copied().max().unwrap_or(0) as usize + 1;
    let (h, w) = win.dim();
    let mut counts = Array2::<f64>::zeros((levels, levels));
    for ((r, c), &v1) in win.indexed_iter() {
        let (r2, c2) = (r as isize + dr, c as isize + dc);
        if r2 < 0 || c2 < 0 || r2 >= h as isize || c2 >= w as isize {
            continue;
        }
        let v2 = win[(r2 as usize, c2 as usize)];
        counts[(v1 as usize, v2 as usize)] += 1.0;
        counts[(v2 as usize, v1 as usize)] += 1.0;
    }
    let drop_zero = ignore_zeros && win.iter().copied().min() == Some(0);
    let mut m = if drop_zero && levels > 1 {
        counts.slice(s![1.., 1..]).to_owned()
    } else {
        counts
    };
    let total: f64 = m.sum();
    if total > 0.0 {
        m /= total;
    }
    m
}

/// 计算归一化共生矩阵 `m` 的 6 个属性, 顺序与 [`PROPS`] 一致.
fn props_of(m: &Array2<f64>) -> [f64; 6] {
    let (mut contrast, mut dissim, mut homog, mut asm) = (0.0, 0.0, 0.0, 0.0);
    let (mut mu_i, mut mu_j) = (0.0, 0.0);
    for ((i, j), &p) in m.indexed_iter() {
        let diff = i as f64 - j as f64;
        contrast += p * diff * diff;
        dissim += p * diff.abs();
        homog += p / (1.0 + diff * diff);
        asm += p * p;
        mu_i += i as f64 * p;
        mu_j += j as f64 * p;
    }
    let (mut sig_i, mut sig_j) = (0.0, 0.0);
    for ((i, j), &p) in m.indexed_iter() {
        sig_i += (i as f64 - mu_i).powi(2) * p;
        sig_j += (j as f64 - mu_j).powi(2) * p;
    }
    let denom = (sig_i * sig_j).sqrt();
    let correlation = if denom < 1e-15 {
        // 灰度恒定时没有线性相关性可言, 记为 1.
        1.0
    } else {
        let mut corr = 0.0;
        for ((i, j), &p) in m.indexed_iter() {
            corr += p * (i as f64 - mu_i) * (j as f64 - mu_j);
        }
        corr / denom
    };
    [contrast, dissim, homog, asm.sqrt(), correlation, asm]
}

/// 对一个量化灰度窗口计算全部 GLCM 特征, 顺序与 [`names`] 一致.
pub fn props(win: ArrayView2<u8>, ignore_zeros: bool) -> Vec<f32> {
    // per_prop[属性][距离] = 对四个方向取平均后的属性值.
    let mut per_prop = [[0.0f64; GLCM_DISTANCES.len()]; PROPS.len()];
    for (di, d) in GLCM_DISTANCES.into_iter().enumerate() {
        let mut acc = [0.0f64; 6];
        for off in offsets(d) {
            let m = comatrix(win, off, ignore_zeros);
            for (a, v) in izip!(&mut acc, props_of(&m)) {
                *a += v;
            }
        }
        for (pi, a) in acc.into_iter().enumerate() {
            per_prop[pi][di] = a / 4.0;
        }
    }

    let mut out = Vec::with_capacity(N_FEATS);
    for dists in per_prop {
        for v in dists {
            out.push(v as f32);
        }
        out.push((dists.iter().sum::<f64>() / dists.len() as f64) as f32);
    }
    out
}

/// GLCM 特征的滑动窗口特征图. 整张切片先经 `gw` 量化, 再逐窗口计算.
/// 返回形状为 `(H, W, 30)` 的数组, 未计算的位置保持 0 填充.
pub fn map(
    sli: ArrayView2<f32>,
    size: usize,
    mask: ArrayView2<bool>,
    gw: &GrayWindow,
) -> Array3<f32> {
    let q = gw.quantize_slice(sli);
    let (h, w) = sli.dim();
    let mut out = Array3::zeros((h, w, N_FEATS));
    for ((i, j), win) in sliding_window(q.view(), size, Some(mask.view())) {
        for (dst, v) in izip!(out.slice_mut(s![i, j, ..]), props(win, false)) {
            *dst = v;
        }
    }
    out
}

/// 对切片中被掩码选中的区域统一计算 GLCM 特征.
///
/// 切片量化后裁剪到选区的最小包围盒, 未选中的像素记为灰度级 0
/// 并从矩阵中剔除. 要求切片中存在选中像素, 否则 panic.
pub fn region(sli: ArrayView2<f32>, mask: ArrayView2<bool>, gw: &GrayWindow) -> Vec<f32> {
    let q = gw.quantize_slice(sli);
    let [(r0, r1), (c0, c1)] =
        bounding_box_2d(mask).expect("GLCM 区域特征要求切片存在选中像素");
    let mut crop = q.slice(s![r0..r1, c0..c1]).to_owned();
    for ((i, j), &sel) in mask.slice(s![r0..r1, c0..c1]).indexed_iter() {
        if !sel {
            crop[(i, j)] = 0;
        }
    }
    props(crop.view(), true)
}

#[cfg(test)]
mod tests {
    use super::{names, offsets, props, N_FEATS};
    use ndarray::Array2;

    fn float_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_names_count() {
        let n = names();
        assert_eq!(n.len(), N_FEATS);
        assert_eq!(n[0], "glcm(contrast,1)");
        assert_eq!(n[4], "glcm(contrast,avg)");
        assert_eq!(n[29], "glcm(ASM,avg)");
    }

    #[test]
    fn test_offsets_cardinal() {
        assert_eq!(offsets(1), [(0, 1), (1, 1), (1, 0), (1, -1)]);
        assert_eq!(offsets(3)[0], (0, 3));
        assert_eq!(offsets(3)[2], (3, 0));
    }

    #[test]
    fn test_props_uniform_window() {
        // 灰度恒定: 对比度/相异度为 0, 能量/ASM/同质性/相关性为 1.
        let win = Array2::<u8>::from_elem((5, 5), 3);
        let f = props(win.view(), false);
        assert!(float_eq(f[4], 0.0)); // contrast avg
        assert!(float_eq(f[9], 0.0)); // dissimilarity avg
        assert!(float_eq(f[14], 1.0)); // homogeneity avg
        assert!(float_eq(f[19], 1.0)); // energy avg
        assert!(float_eq(f[24], 1.0)); // correlation avg
        assert!(float_eq(f[29], 1.0)); // ASM avg
    }

    #[test]
    fn test_props_striped_window() {
        // 垂直条纹: 水平方向上存在灰度跃变, 对比度必然为正.
        let win = Array2::from_shape_fn((6, 6), |(_, j)| (j % 2) as u8);
        let f = props(win.view(), false);
        assert!(f[0] > 0.0); // contrast, 距离 1
        assert!(f[19] < 1.0); // energy avg
    }
}
