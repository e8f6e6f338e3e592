// リサンプリングモジュール
//
// シャッフル・ブートストラップ・周辺度数保存サンプリングなど、
// ランダム化手続きの本体です。全関数が `R: Rng` を引数に取るため、
// テストではシード付き乱数生成器で駆動できます。

use crate::error::{Error, Result};
use rand::seq::SliceRandom;
use rand::Rng;

/// グループをプールしてシャッフルし、元のサイズに再分割する内部実装
///
/// 出力は元のグループと同じ個数・同じサイズで、値の多重集合は保存されます。
pub(crate) fn shuffle_groups_impl<R: Rng>(groups: &[Vec<f64>], rng: &mut R) -> Vec<Vec<f64>> {
    // 全ての値を1つのプールにまとめる
    let mut pool: Vec<f64> = Vec::with_capacity(groups.iter().map(|g| g.len()).sum());
    for grp in groups {
        pool.extend_from_slice(grp);
    }
    // かき混ぜる
    pool.shuffle(rng);
    // 元のグループサイズで再分割
    let mut new_groups = Vec::with_capacity(groups.len());
    let mut start_index = 0;
    for grp in groups {
        let end_index = start_index + grp.len();
        new_groups.push(pool[start_index..end_index].to_vec());
        start_index = end_index;
    }
    new_groups
}

/// 2元配置グリッド版のシャッフル
///
/// 全セルの値をプールしてかき混ぜ、セルごとの元のサイズで再分割します。
pub(crate) fn shuffle_grid_impl<R: Rng>(grid: &[Vec<Vec<f64>>], rng: &mut R) -> Vec<Vec<Vec<f64>>> {
    let mut pool: Vec<f64> = Vec::new();
    for row in grid {
        for grp in row {
            pool.extend_from_slice(grp);
        }
    }
    pool.shuffle(rng);

    let mut new_grid = Vec::with_capacity(grid.len());
    let mut start_index = 0;
    for row in grid {
        let mut new_row = Vec::with_capacity(row.len());
        for grp in row {
            let end_index = start_index + grp.len();
            new_row.push(pool[start_index..end_index].to_vec());
            start_index = end_index;
        }
        new_grid.push(new_row);
    }
    new_grid
}

/// 一様ランダムな並べ替えを返す
///
/// 相関・回帰の有意性検定で対の関係を壊すために使います。
pub(crate) fn permuted_impl<R: Rng>(vals: &[f64], rng: &mut R) -> Vec<f64> {
    let mut out = vals.to_vec();
    out.shuffle(rng);
    out
}

/// 周辺度数を保存したランダムな分割表を生成する内部実装
///
/// セルを行優先で訪問し、行・列の残量の小さい方を上限とする一様乱数で埋めます。
/// 行の最終列は行残量、最終行は列残量で強制されるため、
/// 構成上すべての行計・列計が目標と厳密に一致します。
pub(crate) fn shuffle_table_impl<R: Rng>(
    row_totals: &[u64],
    col_totals: &[u64],
    rng: &mut R,
) -> Result<Vec<u64>> {
    if row_totals.is_empty() || col_totals.is_empty() {
        return Err(Error::Sampling("周辺度数が空です".into()));
    }
    let row_sum: u64 = row_totals.iter().sum();
    let col_sum: u64 = col_totals.iter().sum();
    if row_sum != col_sum {
        return Err(Error::Sampling(format!(
            "行計の合計と列計の合計が一致しません: {} と {}",
            row_sum, col_sum
        )));
    }

    let num_rows = row_totals.len();
    let num_cols = col_totals.len();
    let mut available_row = row_totals.to_vec();
    let mut available_col = col_totals.to_vec();
    let mut new_counts = Vec::with_capacity(num_rows * num_cols);

    for r in 0..num_rows {
        for c in 0..num_cols {
            let value = if r < num_rows - 1 {
                if c < num_cols - 1 {
                    let max_val = available_row[r].min(available_col[c]);
                    rng.gen_range(0..=max_val)
                } else {
                    // 行の最終列: この行の残量がそのまま入る
                    available_row[r]
                }
            } else {
                // 最終行: この列の残量がそのまま入る
                available_col[c]
            };
            available_row[r] = available_row[r].checked_sub(value).ok_or_else(|| {
                Error::Sampling(format!("行 {} の残量が負になりました", r))
            })?;
            available_col[c] = available_col[c].checked_sub(value).ok_or_else(|| {
                Error::Sampling(format!("列 {} の残量が負になりました", c))
            })?;
            new_counts.push(value);
        }
    }
    Ok(new_counts)
}

/// 復元抽出によるブートストラップ標本を生成する内部実装
///
/// 出力の長さは入力と同じで、各要素は入力から一様ランダムに選ばれます。
pub(crate) fn bootstrap_impl<R: Rng>(x: &[f64], rng: &mut R) -> Result<Vec<f64>> {
    if x.is_empty() {
        return Err(Error::EmptyData("ブートストラップにはデータが必要です".into()));
    }
    let n = x.len();
    Ok((0..n).map(|_| x[rng.gen_range(0..n)]).collect())
}

/// 対を保ったブートストラップ標本を生成する内部実装
///
/// 位置ごとに1つのインデックスを引き、それを両方の配列に適用することで
/// (x, y) の対応関係を保存します。回帰・相関の信頼区間で必須です。
pub(crate) fn bootstrap_paired_impl<R: Rng>(
    x: &[f64],
    y: &[f64],
    rng: &mut R,
) -> Result<(Vec<f64>, Vec<f64>)> {
    if x.len() != y.len() {
        return Err(Error::DimensionMismatch(format!(
            "対ブートストラップのデータ長が一致しません: x={}, y={}",
            x.len(),
            y.len()
        )));
    }
    if x.is_empty() {
        return Err(Error::EmptyData("ブートストラップにはデータが必要です".into()));
    }
    let n = x.len();
    let mut samp_x = Vec::with_capacity(n);
    let mut samp_y = Vec::with_capacity(n);
    for _ in 0..n {
        let index = rng.gen_range(0..n);
        samp_x.push(x[index]);
        samp_y.push(y[index]);
    }
    Ok((samp_x, samp_y))
}

/// 期待度数に比例する確率で `num` 回カテゴリを引き、度数を返す内部実装
///
/// 適合度検定のシミュレーションで、帰無仮説どおりのサイコロを振る操作です。
pub(crate) fn draw_from_categories_impl<R: Rng>(
    num: usize,
    expected: &[f64],
    rng: &mut R,
) -> Result<Vec<f64>> {
    if expected.is_empty() {
        return Err(Error::EmptyData("カテゴリがありません".into()));
    }
    // 各カテゴリの重みを累積してビンを作る
    let mut bins = Vec::with_capacity(expected.len());
    let mut max = 0.0;
    for &e in expected {
        if e <= 0.0 {
            return Err(Error::InvalidValue(format!("期待度数は正の値である必要があります: {}", e)));
        }
        max += e;
        bins.push(max);
    }

    let mut observed = vec![0.0; expected.len()];
    for _ in 0..num {
        let draw = rng.gen_range(0.0..max);
        // このビンはどのカテゴリか
        let mut b = 0;
        while b < bins.len() - 1 && draw >= bins[b] {
            b += 1;
        }
        observed[b] += 1.0;
    }
    Ok(observed)
}

/// 確率pの試行をn回行い、成功回数を返す内部実装
///
/// 元の手続きに合わせて、一様乱数の引き当て空間（drawspace）を
/// 成功領域 p·drawspace と比較する形で実装しています。
pub(crate) fn count_successes_impl<R: Rng>(p: f64, n: usize, rng: &mut R) -> Result<usize> {
    if p <= 0.0 || p > 1.0 {
        return Err(Error::InvalidValue(format!("確率は (0, 1] の範囲である必要があります: {}", p)));
    }
    let drawspace = (1.0 / p) * 1000.0 + 0.05;
    let mut success = 0;
    for _ in 0..n {
        let outcome = rng.gen_range(0.0..drawspace);
        if p * drawspace >= outcome {
            success += 1;
        }
    }
    Ok(success)
}
