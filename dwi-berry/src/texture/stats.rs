//! 基本统计特征. 此类特征不考虑像素间的空间关系.

use itertools::izip;
use ndarray::{s, Array3, ArrayView2};
use num::Float;

use crate::data::swin::sliding_window;

/// 特征顺序: 均值/标准差/极差, 五数概括, 九个十分位数, 峰度与偏度.
const NAMES: [&str; 19] = [
    "mean", "stddev", "range", "min", "q1", "median", "q3", "max", "decile1", "decile2", "decile3",
    "decile4", "decile5", "decile6", "decile7", "decile8", "decile9", "kurtosis", "skewness",
];

/// 特征名列表, 与 [`feats`] 的输出顺序一致.
pub fn names() -> Vec<String> {
    NAMES.iter().map(|n| format!("stats({n})")).collect()
}

/// 求 `vals` 的算术平均值. `vals` 为空时 panic.
pub(crate) fn mean_of<T: Float>(vals: &[T]) -> T {
    assert!(!vals.is_empty());
    let sum = vals.iter().fold(T::zero(), |acc, &v| acc + v);
    // 非空切片长度总能转换为浮点数.
    sum / T::from(vals.len()).unwrap()
}

/// 求 `vals` 的 `k` 阶中心矩.
fn central_moment<T: Float>(vals: &[T], mean: T, k: i32) -> T {
    let sum = vals
        .iter()
        .fold(T::zero(), |acc, &v| acc + (v - mean).powi(k));
    sum / T::from(vals.len()).unwrap()
}

/// 求升序序列 `sorted` 的第 `q` 百分位数, 线性插值.
pub(crate) fn percentile<T: Float>(sorted: &[T], q: T) -> T {
    assert!(!sorted.is_empty());
    let hundred = T::from(100.0).unwrap();
    let rank = q / hundred * T::from(sorted.len() - 1).unwrap();
    let lo = rank.floor();
    let frac = rank - lo;
    let lo = lo.to_usize().unwrap();
    let hi = (lo + 1).min(sorted.len() - 1);
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// 计算 `vals` 的 19 个统计特征, 顺序与 [`names`] 一致.
///
/// `vals` 为空时 panic. 输入取值恒定时, 峰度与偏度记为 0.
pub fn feats(vals: &[f32]) -> Vec<f32> {
    assert!(!vals.is_empty(), "统计特征需要至少一个体素");
    let mut sorted = vals.to_vec();
    sorted.sort_unstable_by(|a, b| a.total_cmp(b));
    let (min, max) = (sorted[0], sorted[sorted.len() - 1]);

    let mean = mean_of(vals);
    let m2 = central_moment(vals, mean, 2);
    let stddev = m2.sqrt();

    let mut out = Vec::with_capacity(NAMES.len());
    out.push(mean);
    out.push(stddev);
    out.push(max - min);

    out.push(min);
    for q in [25.0, 50.0, 75.0] {
        out.push(percentile(&sorted, q));
    }
    out.push(max);

    for d in 1..10 {
        out.push(percentile(&sorted, (d * 10) as f32));
    }

    // 取值恒定时二阶矩为 0, 高阶统计量退化记为 0.
    if m2 > f32::EPSILON {
        let m3 = central_moment(vals, mean, 3);
        let m4 = central_moment(vals, mean, 4);
        out.push(m4 / (m2 * m2) - 3.0);
        out.push(m3 / (m2 * m2.sqrt()));
    } else {
        out.push(0.0);
        out.push(0.0);
    }
    debug_assert_eq!(out.len(), NAMES.len());
    out
}

/// 统计特征的滑动窗口特征图. 返回形状为 `(H, W, 19)` 的数组,
/// 未计算的位置保持 0 填充.
pub fn map<'a>(sli: ArrayView2<'a, f32>, size: usize, mask: ArrayView2<'a, bool>) -> Array3<f32> {
    let (h, w) = sli.dim();
    let mut out = Array3::zeros((h, w, NAMES.len()));
    for ((i, j), win) in sliding_window(sli, size, Some(mask)) {
        let vals: Vec<f32> = win.iter().copied().collect();
        for (dst, v) in izip!(out.slice_mut(s![i, j, ..]), feats(&vals)) {
            *dst = v;
        }
    }
    out
}

/// 对切片中被掩码选中的全部像素统一计算统计特征.
pub fn region(sli: ArrayView2<f32>, mask: ArrayView2<bool>) -> Vec<f32> {
    let vals: Vec<f32> = izip!(sli.iter(), mask.iter())
        .filter_map(|(&v, &sel)| sel.then_some(v))
        .collect();
    feats(&vals)
}

#[cfg(test)]
mod tests {
    use super::{feats, names, percentile};

    fn float_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_names_parallel_to_feats() {
        assert_eq!(names().len(), feats(&[1.0, 2.0]).len());
        assert_eq!(names()[0], "stats(mean)");
    }

    #[test]
    fn test_feats_generic() {
        let f = feats(&[1.0, 2.0, 3.0, 4.0]);
        assert!(float_eq(f[0], 2.5)); // mean
        assert!(float_eq(f[1], 1.25f32.sqrt())); // stddev (总体)
        assert!(float_eq(f[2], 3.0)); // range
        assert!(float_eq(f[3], 1.0)); // min
        assert!(float_eq(f[5], 2.5)); // median
        assert!(float_eq(f[7], 4.0)); // max
        // decile5 与中位数一致.
        assert!(float_eq(f[13], f[5]));
    }

    #[test]
    fn test_feats_constant_input() {
        let f = feats(&[7.0; 9]);
        assert!(float_eq(f[0], 7.0));
        assert!(float_eq(f[1], 0.0));
        assert!(float_eq(f[2], 0.0));
        assert!(float_eq(f[17], 0.0)); // kurtosis
        assert!(float_eq(f[18], 0.0)); // skewness
    }

    #[test]
    fn test_percentile_interpolation() {
        let sorted = [0.0f32, 10.0];
        assert!(float_eq(percentile(&sorted, 0.0), 0.0));
        assert!(float_eq(percentile(&sorted, 25.0), 2.5));
        assert!(float_eq(percentile(&sorted, 100.0), 10.0));
    }
}
