//! 矩类形状特征: Hu 矩与 Zernike 矩.

use std::f64::consts::PI;

use itertools::izip;
use ndarray::{s, Array3, ArrayView2};

use crate::consts::ZERNIKE_DEGREE;
use crate::data::swin::sliding_window;

// ---------------------------------------------------------------- Hu 矩

/// Hu 矩特征名列表.
pub fn hu_names() -> Vec<String> {
    (0..7).map(|i| format!("hu({i})")).collect()
}

/// 计算一个窗口的七个 Hu 矩.
///
/// 中心矩围绕窗口的几何中心计算; 归一化后取绝对值的对数
/// (最后一个矩在镜像下变号, 取绝对值后对镜像也不变).
/// 值为 0 的矩在取对数前记为 1, 非有限结果记为 0.
pub fn hu(win: ArrayView2<f32>) -> [f32; 7] {
    let (h, w) = win.dim();
    let (cr, cc) = (h as f64 / 2.0, w as f64 / 2.0);

    // 三阶以内的中心矩.
    let mut mu = [[0.0f64; 4]; 4];
    for ((i, j), &v) in win.indexed_iter() {
        let (dr, dc) = (i as f64 - cr, j as f64 - cc);
        for (p, row) in mu.iter_mut().enumerate() {
            for (q, cell) in row.iter_mut().enumerate() {
                if p + q <= 3 {
                    *cell += v as f64 * dr.powi(p as i32) * dc.powi(q as i32);
                }
            }
        }
    }

    // 归一化矩. 零质量窗口直接给出全零结果.
    if mu[0][0].abs() < 1e-12 {
        return [0.0; 7];
    }
    let mut nu = [[0.0f64; 4]; 4];
    for p in 0..4 {
        for q in 0..4 {
            if p + q >= 2 && p + q <= 3 {
                nu[p][q] = mu[p][q] / mu[0][0].powf(1.0 + (p + q) as f64 / 2.0);
            }
        }
    }

    let (n20, n02, n11) = (nu[2][0], nu[0][2], nu[1][1]);
    let (n30, n03, n21, n12) = (nu[3][0], nu[0][3], nu[2][1], nu[1][2]);
    let m = [
        n20 + n02,
        (n20 - n02).powi(2) + 4.0 * n11 * n11,
        (n30 - 3.0 * n12).powi(2) + (3.0 * n21 - n03).powi(2),
        (n30 + n12).powi(2) + (n21 + n03).powi(2),
        (n30 - 3.0 * n12)
            * (n30 + n12)
            * ((n30 + n12).powi(2) - 3.0 * (n21 + n03).powi(2))
            + (3.0 * n21 - n03)
                * (n21 + n03)
                * (3.0 * (n30 + n12).powi(2) - (n21 + n03).powi(2)),
        (n20 - n02) * ((n30 + n12).powi(2) - (n21 + n03).powi(2))
            + 4.0 * n11 * (n30 + n12) * (n21 + n03),
        (3.0 * n21 - n03)
            * (n30 + n12)
            * ((n30 + n12).powi(2) - 3.0 * (n21 + n03).powi(2))
            - (n30 - 3.0 * n12)
                * (n21 + n03)
                * (3.0 * (n30 + n12).powi(2) - (n21 + n03).powi(2)),
    ];

    m.map(|v| {
        let v = v.abs();
        let v = if v == 0.0 { 1.0 } else { v };
        let v = v.ln() as f32;
        if v.is_finite() {
            v
        } else {
            0.0
        }
    })
}

/// Hu 矩的滑动窗口特征图. 返回形状为 `(H, W, 7)` 的数组,
/// 未计算的位置保持 0 填充.
pub fn hu_map<'a>(sli: ArrayView2<'a, f32>, size: usize, mask: ArrayView2<'a, bool>) -> Array3<f32> {
    let (h, w) = sli.dim();
    let mut out = Array3::zeros((h, w, 7));
    for ((i, j), win) in sliding_window(sli, size, Some(mask)) {
        for (dst, v) in izip!(out.slice_mut(s![i, j, ..]), hu(win)) {
            *dst = v;
        }
    }
    out
}

// ------------------------------------------------------------ Zernike 矩

/// Zernike 矩的 (阶数, 角频率) 组合, 阶数不超过 [`ZERNIKE_DEGREE`].
fn zernike_orders() -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    for n in 0..=ZERNIKE_DEGREE {
        for m in (n % 2..=n).step_by(2) {
            out.push((n, m));
        }
    }
    out
}

/// Zernike 矩特征名列表.
pub fn zernike_names() -> Vec<String> {
    zernike_orders()
        .into_iter()
        .map(|(n, m)| format!("zernike({n},{m})"))
        .collect()
}

fn factorial(n: usize) -> f64 {
    (1..=n).map(|v| v as f64).product()
}

/// Zernike 径向多项式 R_nm(ρ).
fn radial(n: usize, m: usize, rho: f64) -> f64 {
    let mut sum = 0.0;
    for sgn in 0..=(n - m) / 2 {
        let num = factorial(n - sgn);
        let den =
            factorial(sgn) * factorial((n + m) / 2 - sgn) * factorial((n - m) / 2 - sgn);
        let term = num / den * rho.powi((n - 2 * sgn) as i32);
        sum += if sgn % 2 == 0 { term } else { -term };
    }
    sum
}

/// 计算一个窗口的 Zernike 矩幅值, 顺序与 [`zernike_names`] 一致.
///
/// 只统计以像素质心为圆心、`radius` 为半径的圆盘内的像素;
/// 像素值按圆盘内总质量归一化. 零质量窗口给出全零结果.
pub fn zernike(win: ArrayView2<f32>, radius: f64) -> Vec<f32> {
    let orders = zernike_orders();

    // 像素质心. 质量为 0 时退化为几何中心.
    let (h, w) = win.dim();
    let total: f64 = win.iter().map(|&v| v as f64).sum();
    let (cy, cx) = if total.abs() < 1e-12 {
        ((h as f64 - 1.0) / 2.0, (w as f64 - 1.0) / 2.0)
    } else {
        let mut cy = 0.0;
        let mut cx = 0.0;
        for ((i, j), &v) in win.indexed_iter() {
            cy += i as f64 * v as f64;
            cx += j as f64 * v as f64;
        }
        (cy / total, cx / total)
    };

    // 圆盘内质量.
    let mut disc_total = 0.0;
    for ((i, j), &v) in win.indexed_iter() {
        let (dy, dx) = (i as f64 - cy, j as f64 - cx);
        if dy.hypot(dx) <= radius {
            disc_total += v as f64;
        }
    }
    if disc_total.abs() < 1e-12 {
        return vec![0.0; orders.len()];
    }

    let mut acc_re = vec![0.0f64; orders.len()];
    let mut acc_im = vec![0.0f64; orders.len()];
    for ((i, j), &v) in win.indexed_iter() {
        let (dy, dx) = (i as f64 - cy, j as f64 - cx);
        let rho = dy.hypot(dx) / radius;
        if rho > 1.0 {
            continue;
        }
        let theta = dy.atan2(dx);
        let f = v as f64 / disc_total;
        for (k, &(n, m)) in orders.iter().enumerate() {
            let r = radial(n, m, rho);
            acc_re[k] += f * r * (m as f64 * theta).cos();
            acc_im[k] -= f * r * (m as f64 * theta).sin();
        }
    }

    izip!(orders, acc_re, acc_im)
        .map(|((n, _), re, im)| ((n as f64 + 1.0) / PI * re.hypot(im)) as f32)
        .collect()
}

/// Zernike 矩的滑动窗口特征图. 圆盘半径为 `size / 2`.
/// 返回形状为 `(H, W, 25)` 的数组, 未计算的位置保持 0 填充.
pub fn zernike_map<'a>(sli: ArrayView2<'a, f32>, size: usize, mask: ArrayView2<'a, bool>) -> Array3<f32> {
    let radius = (size / 2) as f64;
    let (h, w) = sli.dim();
    let n_feats = zernike_orders().len();
    let mut out = Array3::zeros((h, w, n_feats));
    for ((i, j), win) in sliding_window(sli, size, Some(mask)) {
        for (dst, v) in izip!(out.slice_mut(s![i, j, ..]), zernike(win, radius)) {
            *dst = v;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{hu, hu_names, radial, zernike, zernike_names, zernike_orders};
    use ndarray::Array2;
    use std::f64::consts::PI;

    fn float_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_hu_len_and_finite() {
        assert_eq!(hu_names().len(), 7);
        let win = Array2::from_shape_fn((5, 5), |(i, j)| (i + 2 * j) as f32);
        let m = hu(win.view());
        assert!(m.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_hu_zero_window() {
        let win = Array2::<f32>::zeros((5, 5));
        assert_eq!(hu(win.view()), [0.0; 7]);
    }

    #[test]
    fn test_zernike_orders_count() {
        // 0..=8 阶共 25 个 (阶数, 角频率) 组合.
        assert_eq!(zernike_orders().len(), 25);
        assert_eq!(zernike_names().len(), 25);
        assert_eq!(zernike_names()[0], "zernike(0,0)");
        assert_eq!(zernike_names()[24], "zernike(8,8)");
    }

    #[test]
    fn test_radial_low_orders() {
        // R_00 恒为 1; R_11(ρ) = ρ; R_20(ρ) = 2ρ² - 1.
        assert!((radial(0, 0, 0.7) - 1.0).abs() < 1e-12);
        assert!((radial(1, 1, 0.7) - 0.7).abs() < 1e-12);
        assert!((radial(2, 0, 0.7) - (2.0 * 0.49 - 1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_zernike_constant_window() {
        // 常值窗口: A_00 = Σ f/Σf · R_00 = 1, 故 |Z_00| = 1/π.
        let win = Array2::<f32>::from_elem((5, 5), 3.0);
        let z = zernike(win.view(), 2.0);
        assert!(float_eq(z[0], (1.0 / PI) as f32));
    }
}
