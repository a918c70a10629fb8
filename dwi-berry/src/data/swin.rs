//! 滑动窗口迭代.

use either::Either;
use ndarray::{s, ArrayView2};

use crate::Idx2d;

/// 获取在 `img` 上以 `size` 为边长滑动窗口的惰性迭代器.
///
/// 迭代器按行优先序产出 `(锚点, 窗口)` 对. 窗口完整地落在切片内部,
/// 锚点为窗口中心 (`左上角 + size / 2`). 若给定掩码 `mask`,
/// 则跳过内容中不含任何选中像素的窗口; 锚点自身是否被选中不影响跳过与否.
///
/// 迭代器是有限的, 重新调用本函数即可重新开始迭代.
///
/// # 注意
///
/// 1. 要求 `1 <= size <= min(H, W)`, 否则程序 panic;
///   边界的预先检查由上层 (如纹理层入口) 负责.
/// 2. 若给定掩码, 其形状必须与 `img` 一致, 否则程序 panic.
pub fn sliding_window<'a, T>(
    img: ArrayView2<'a, T>,
    size: usize,
    mask: Option<ArrayView2<'a, bool>>,
) -> impl Iterator<Item = (Idx2d, ArrayView2<'a, T>)> {
    let (h, w) = img.dim();
    assert!(
        size >= 1 && size <= h && size <= w,
        "窗口边长 {size} 超出切片形状 ({h}, {w})"
    );
    if let Some(m) = mask {
        assert_eq!(m.dim(), img.dim(), "掩码与切片形状不一致");
    }
    let half = size / 2;

    let tops = (0..=h - size).flat_map(move |i| (0..=w - size).map(move |j| (i, j)));
    let tops = match mask {
        Some(m) => Either::Left(tops.filter(move |&(i, j)| {
            m.slice(s![i..i + size, j..j + size]).iter().any(|&b| b)
        })),
        None => Either::Right(tops),
    };
    tops.map(move |(i, j)| {
        let win = img.clone().slice_move(s![i..i + size, j..j + size]);
        ((i + half, j + half), win)
    })
}

#[cfg(test)]
mod tests {
    use super::sliding_window;
    use ndarray::{arr2, Array2};

    #[test]
    fn test_full_enumeration_row_major() {
        let img = Array2::<f32>::zeros((4, 5));
        let anchors: Vec<_> = sliding_window(img.view(), 3, None)
            .map(|(pos, _)| pos)
            .collect();
        // (4 - 3 + 1) * (5 - 3 + 1) 个位置, 行优先.
        assert_eq!(anchors.len(), 6);
        assert_eq!(
            anchors,
            vec![(1, 1), (1, 2), (1, 3), (2, 1), (2, 2), (2, 3)]
        );
    }

    #[test]
    fn test_window_content() {
        let img = arr2(&[
            [0.0f32, 1.0, 2.0],
            [3.0, 4.0, 5.0],
            [6.0, 7.0, 8.0],
        ]);
        let all: Vec<_> = sliding_window(img.view(), 3, None).collect();
        assert_eq!(all.len(), 1);
        let (pos, win) = &all[0];
        assert_eq!(*pos, (1, 1));
        assert_eq!(win[(0, 0)], 0.0);
        assert_eq!(win[(2, 2)], 8.0);
    }

    #[test]
    fn test_mask_skips_empty_windows() {
        let img = Array2::<f32>::zeros((4, 4));
        let mut mask = Array2::from_elem((4, 4), false);
        // 只有角上一个选中像素, 3x3 窗口中仅左上窗口与其相交.
        mask[(0, 0)] = true;
        let anchors: Vec<_> = sliding_window(img.view(), 3, Some(mask.view()))
            .map(|(pos, _)| pos)
            .collect();
        assert_eq!(anchors, vec![(1, 1)]);

        let none = Array2::from_elem((4, 4), false);
        assert_eq!(sliding_window(img.view(), 3, Some(none.view())).count(), 0);
    }

    #[test]
    fn test_restartable() {
        let img = Array2::<f32>::zeros((5, 5));
        let a: Vec<_> = sliding_window(img.view(), 3, None).map(|(p, _)| p).collect();
        let b: Vec<_> = sliding_window(img.view(), 3, None).map(|(p, _)| p).collect();
        assert_eq!(a, b);
    }

    #[test]
    #[should_panic]
    fn test_oversized_window_panics() {
        let img = Array2::<f32>::zeros((4, 4));
        let _ = sliding_window(img.view(), 5, None).count();
    }
}
