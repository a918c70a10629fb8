//! Sobel 边缘特征.
//!
//! 与其他窗口方法不同, Sobel 算子直接作用于整张切片, 不做窗口滑动;
//! 调用方传入的窗口边长仅为接口兼容, 会被忽略.

use ndarray::{Array2, Array3, ArrayView2};

/// 特征名列表: 全图梯度幅值与掩码限制下的梯度幅值.
pub fn names() -> Vec<String> {
    vec!["sobel".to_owned(), "sobel_mask".to_owned()]
}

/// 反射边界索引.
#[inline]
fn reflect(i: isize, n: usize) -> usize {
    if i < 0 {
        (-i - 1) as usize
    } else if i >= n as isize {
        2 * n - i as usize - 1
    } else {
        i as usize
    }
}

/// 计算整张切片的 Sobel 梯度幅值.
///
/// 水平/垂直核均以 4 归一化, 幅值再除以 √2, 保证输出不超过输入的取值范围.
pub fn magnitude(sli: ArrayView2<f32>) -> Array2<f32> {
    const K: [[f64; 3]; 3] = [[1.0, 2.0, 1.0], [0.0, 0.0, 0.0], [-1.0, -2.0, -1.0]];
    let (h, w) = sli.dim();
    Array2::from_shape_fn((h, w), |(i, j)| {
        let mut gh = 0.0;
        let mut gv = 0.0;
        for (di, row) in K.iter().enumerate() {
            for (dj, &k) in row.iter().enumerate() {
                let y = reflect(i as isize + di as isize - 1, h);
                let x = reflect(j as isize + dj as isize - 1, w);
                let v = sli[(y, x)] as f64;
                gh += k / 4.0 * v;
                // 垂直核为水平核的转置.
                gv += K[dj][di] / 4.0 * v;
            }
        }
        (gh.hypot(gv) / std::f64::consts::SQRT_2) as f32
    })
}

/// 腐蚀后的掩码: 仅当像素及其 8-邻居全部选中时保留.
fn erode(mask: ArrayView2<bool>) -> Array2<bool> {
    let (h, w) = mask.dim();
    Array2::from_shape_fn((h, w), |(i, j)| {
        (-1isize..=1).all(|di| {
            (-1isize..=1).all(|dj| {
                let (y, x) = (i as isize + di, j as isize + dj);
                y >= 0 && x >= 0 && y < h as isize && x < w as isize && mask[(y as usize, x as usize)]
            })
        })
    })
}

/// Sobel 特征图: 通道 0 为全图梯度幅值, 通道 1 为掩码腐蚀后
/// 保留的梯度幅值 (掩码外记 0). 返回形状为 `(H, W, 2)` 的数组.
pub fn map(sli: ArrayView2<f32>, mask: ArrayView2<bool>) -> Array3<f32> {
    let (h, w) = sli.dim();
    let mag = magnitude(sli);
    let eroded = erode(mask);
    let mut out = Array3::zeros((h, w, 2));
    for ((i, j), &m) in mag.indexed_iter() {
        out[(i, j, 0)] = m;
        out[(i, j, 1)] = if eroded[(i, j)] { m } else { 0.0 };
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{magnitude, map, names};
    use ndarray::Array2;

    fn float_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_constant_slice_no_edges() {
        let sli = Array2::<f32>::from_elem((4, 4), 5.0);
        assert!(magnitude(sli.view()).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_ramp_slice() {
        // 水平线性渐变: 内部每点 |∂x| = 2, 幅值为 2 / √2 = √2.
        let sli = Array2::from_shape_fn((5, 5), |(_, j)| j as f32);
        let m = magnitude(sli.view());
        assert!(float_eq(m[(2, 2)], 2.0f32.sqrt()));
        // 反射边界下边缘列只剩一半梯度.
        assert!(float_eq(m[(2, 0)], 1.0 / 2.0f32.sqrt()));
    }

    #[test]
    fn test_mask_channel() {
        let sli = Array2::from_shape_fn((5, 5), |(_, j)| j as f32);
        let mut mask = Array2::from_elem((5, 5), false);
        for i in 0..3 {
            for j in 0..3 {
                mask[(i, j)] = true;
            }
        }
        let out = map(sli.view(), mask.view());
        assert_eq!(names().len(), out.dim().2);
        // 只有 (1, 1) 的 8-邻居全部选中.
        assert!(out[(1, 1, 1)] > 0.0);
        assert!(float_eq(out[(2, 2, 1)], 0.0));
        // 通道 0 不受掩码影响.
        assert!(out[(2, 2, 0)] > 0.0);
    }
}
