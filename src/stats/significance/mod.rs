// 有意性検定モジュール
//
// 並べ替え（シャッフル）検定の実行部です。観測統計量を一度だけ計算し、
// リサンプリング→再計算→比較を既定で10,000回繰り返して
// 経験的な裾確率を求めます。

use crate::dataset::ContingencyTable;
use crate::error::{Error, Result};
use crate::stats::resample::{
    count_successes_impl, draw_from_categories_impl, permuted_impl, shuffle_grid_impl,
    shuffle_groups_impl, shuffle_table_impl,
};
use crate::stats::statistic::{
    chi_squared_impl, fishers_exact_impl, mean_diff_impl, one_way_f_impl, pearson_r_impl,
    regression_line_impl, two_way_f_impl,
};
use crate::stats::{SignificanceResult, TailDirection};
use rand::Rng;

/// リサンプリング試行を回して裾の計数をまとめる共通ループ
fn run_trials<R, F>(
    observed: f64,
    direction: TailDirection,
    trials: usize,
    rng: &mut R,
    mut trial_stat: F,
) -> Result<SignificanceResult>
where
    R: Rng,
    F: FnMut(&mut R) -> Result<f64>,
{
    if trials == 0 {
        return Err(Error::InvalidValue("試行回数は正の値である必要があります".into()));
    }
    let mut count = 0usize;
    for _ in 0..trials {
        let stat = trial_stat(rng)?;
        let in_tail = match direction {
            TailDirection::GreaterOrEqual => stat >= observed,
            TailDirection::LessOrEqual => stat <= observed,
        };
        if in_tail {
            count += 1;
        }
    }
    Ok(SignificanceResult {
        observed,
        count,
        trials,
        p_value: count as f64 / trials as f64,
        direction,
    })
}

/// 観測値の符号から比較方向を決める
///
/// 観測値が負なら「以下」、それ以外は「以上」を数えます。
fn direction_for(observed: f64) -> TailDirection {
    if observed < 0.0 {
        TailDirection::LessOrEqual
    } else {
        TailDirection::GreaterOrEqual
    }
}

/// 2群の平均値の差の並べ替え検定の内部実装
pub(crate) fn mean_diff_test_impl<R: Rng>(
    a: &[f64],
    b: &[f64],
    trials: usize,
    rng: &mut R,
) -> Result<SignificanceResult> {
    let observed = mean_diff_impl(a, b)?;
    let groups = vec![a.to_vec(), b.to_vec()];
    run_trials(observed, direction_for(observed), trials, rng, |rng| {
        let shuffled = shuffle_groups_impl(&groups, rng);
        mean_diff_impl(&shuffled[0], &shuffled[1])
    })
}

/// ピアソン相関係数の並べ替え検定の内部実装
///
/// 各試行で y を一様ランダムに並べ替え、対の関係を壊します。
pub(crate) fn correlation_test_impl<R: Rng>(
    x: &[f64],
    y: &[f64],
    trials: usize,
    rng: &mut R,
) -> Result<SignificanceResult> {
    let observed = pearson_r_impl(x, y)?;
    run_trials(observed, direction_for(observed), trials, rng, |rng| {
        let shuffled_y = permuted_impl(y, rng);
        pearson_r_impl(x, &shuffled_y)
    })
}

/// 回帰直線の傾きの並べ替え検定の内部実装
pub(crate) fn regression_test_impl<R: Rng>(
    x: &[f64],
    y: &[f64],
    trials: usize,
    rng: &mut R,
) -> Result<SignificanceResult> {
    let observed = regression_line_impl(x, y)?.slope;
    run_trials(observed, direction_for(observed), trials, rng, |rng| {
        let shuffled_y = permuted_impl(y, rng);
        Ok(regression_line_impl(x, &shuffled_y)?.slope)
    })
}

/// 一元配置分散分析の並べ替え検定の内部実装
pub(crate) fn one_way_anova_test_impl<R: Rng>(
    groups: &[Vec<f64>],
    trials: usize,
    rng: &mut R,
) -> Result<SignificanceResult> {
    let observed = one_way_f_impl(groups)?;
    run_trials(observed, TailDirection::GreaterOrEqual, trials, rng, |rng| {
        one_way_f_impl(&shuffle_groups_impl(groups, rng))
    })
}

/// 二元配置分散分析（交互作用）の並べ替え検定の内部実装
pub(crate) fn two_way_anova_test_impl<R: Rng>(
    grid: &[Vec<Vec<f64>>],
    trials: usize,
    rng: &mut R,
) -> Result<SignificanceResult> {
    let observed = two_way_f_impl(grid)?;
    run_trials(observed, TailDirection::GreaterOrEqual, trials, rng, |rng| {
        two_way_f_impl(&shuffle_grid_impl(grid, rng))
    })
}

/// カイ二乗適合度検定（1変数）の内部実装
///
/// 各試行では期待度数に比例する確率で観測総数ぶんのカテゴリを引き直します。
pub(crate) fn chi_squared_fit_test_impl<R: Rng>(
    expected: &[f64],
    observed: &[f64],
    trials: usize,
    rng: &mut R,
) -> Result<SignificanceResult> {
    let observed_chi2 = chi_squared_impl(expected, observed)?;
    let num_observations = observed.iter().sum::<f64>().round() as usize;
    run_trials(observed_chi2, TailDirection::GreaterOrEqual, trials, rng, |rng| {
        let simulated = draw_from_categories_impl(num_observations, expected, rng)?;
        chi_squared_impl(expected, &simulated)
    })
}

/// 分割表の周辺度数を u64 列に変換
///
/// 周辺度数保存サンプラーは整数カウントを前提とします。
fn totals_as_counts(totals: &[f64]) -> Result<Vec<u64>> {
    totals
        .iter()
        .map(|&t| {
            if t < 0.0 || t.fract() != 0.0 {
                Err(Error::Sampling(format!(
                    "周辺度数は非負の整数である必要があります: {}",
                    t
                )))
            } else {
                Ok(t as u64)
            }
        })
        .collect()
}

/// カイ二乗独立性検定（多変数）の内部実装
///
/// 期待度数は観測表の周辺度数から求め、各試行では周辺度数を保存した
/// ランダムな分割表を生成して同じ期待度数と比較します。
pub(crate) fn chi_squared_independence_test_impl<R: Rng>(
    table: &ContingencyTable,
    trials: usize,
    rng: &mut R,
) -> Result<SignificanceResult> {
    let expected = table.expected()?;
    let observed_chi2 = chi_squared_impl(&expected, table.counts())?;

    // 期待度数が5未満のセルは近似の信頼性が下がる
    for &e in &expected {
        if e < 5.0 {
            log::warn!("期待度数が5未満のセルがあります: {:.3}", e);
        }
    }

    let row_totals = totals_as_counts(&table.row_totals())?;
    let col_totals = totals_as_counts(&table.col_totals())?;
    run_trials(observed_chi2, TailDirection::GreaterOrEqual, trials, rng, |rng| {
        let counts = shuffle_table_impl(&row_totals, &col_totals, rng)?;
        let counts_f64: Vec<f64> = counts.iter().map(|&v| v as f64).collect();
        chi_squared_impl(&expected, &counts_f64)
    })
}

/// フィッシャーの正確検定の並べ替え検定の内部実装
///
/// 各試行では周辺度数を保存した 2×2 表を生成し、その片側裾確率が
/// 観測の裾確率以下（= より起こりにくい）になった回数を数えます。
pub(crate) fn fishers_exact_test_impl<R: Rng>(
    a: u64,
    b: u64,
    c: u64,
    d: u64,
    trials: usize,
    rng: &mut R,
) -> Result<SignificanceResult> {
    let observed = fishers_exact_impl(a, b, c, d)?;
    let row_totals = [a + b, c + d];
    let col_totals = [a + c, b + d];
    run_trials(observed, TailDirection::LessOrEqual, trials, rng, |rng| {
        let t = shuffle_table_impl(&row_totals, &col_totals, rng)?;
        fishers_exact_impl(t[0], t[1], t[2], t[3])
    })
}

/// コインの公正さの検定の内部実装
///
/// 確率pのコインをtosses回投げる実験を試行回数ぶんシミュレートし、
/// 観測された表の回数以上が出た実験の割合を返します。
pub(crate) fn coin_test_impl<R: Rng>(
    heads: usize,
    tosses: usize,
    p: f64,
    trials: usize,
    rng: &mut R,
) -> Result<SignificanceResult> {
    if heads > tosses {
        return Err(Error::InvalidInput(format!(
            "表の回数 {} が投げた回数 {} を超えています",
            heads, tosses
        )));
    }
    run_trials(heads as f64, TailDirection::GreaterOrEqual, trials, rng, |rng| {
        Ok(count_successes_impl(p, tosses, rng)? as f64)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const TRIALS: usize = 2000;

    #[test]
    fn test_mean_diff_test_drug_example() {
        let mut rng = StdRng::seed_from_u64(100);
        let placebo = vec![54.0, 51.0, 58.0, 44.0, 55.0, 52.0, 42.0, 47.0, 58.0, 46.0];
        let drug = vec![54.0, 73.0, 53.0, 70.0, 73.0, 68.0, 52.0, 65.0, 65.0];
        let result = mean_diff_test_impl(&placebo, &drug, TRIALS, &mut rng).unwrap();
        assert!((result.observed - 12.966666666666661).abs() < 1e-9);
        assert_eq!(result.direction, TailDirection::GreaterOrEqual);
        assert_eq!(result.trials, TRIALS);
        // 実際の差は大きいので、偶然で同等以上の差が出ることはめったにない
        assert!(result.p_value < 0.05);
    }

    #[test]
    fn test_mean_diff_test_negative_direction() {
        let mut rng = StdRng::seed_from_u64(101);
        // グループBの平均が小さいので観測値は負になり、方向は「以下」
        let a = vec![10.0, 11.0, 12.0, 13.0];
        let b = vec![1.0, 2.0, 3.0, 4.0];
        let result = mean_diff_test_impl(&a, &b, TRIALS, &mut rng).unwrap();
        assert!(result.observed < 0.0);
        assert_eq!(result.direction, TailDirection::LessOrEqual);
    }

    #[test]
    fn test_correlation_test_uncorrelated() {
        let mut rng = StdRng::seed_from_u64(102);
        // ほぼ無相関のデータでは高いp値になる
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let y = vec![4.0, 1.0, 6.0, 2.0, 8.0, 3.0, 5.0, 2.5];
        let result = correlation_test_impl(&x, &y, TRIALS, &mut rng).unwrap();
        assert!(result.p_value > 0.05);
    }

    #[test]
    fn test_one_way_anova_test() {
        let mut rng = StdRng::seed_from_u64(103);
        let groups = vec![
            vec![45.0, 44.0, 34.0, 33.0, 45.0, 46.0, 34.0],
            vec![34.0, 34.0, 50.0, 49.0, 48.0, 39.0, 45.0],
            vec![24.0, 34.0, 23.0, 25.0, 36.0, 28.0, 33.0, 29.0],
        ];
        let result = one_way_anova_test_impl(&groups, TRIALS, &mut rng).unwrap();
        assert!((result.observed - 11.271756509821838).abs() < 1e-9);
        assert!(result.p_value < 0.05);
    }

    #[test]
    fn test_two_way_anova_test() {
        let mut rng = StdRng::seed_from_u64(104);
        let grid = vec![
            vec![vec![15.0, 12.0, 13.0, 16.0], vec![13.0, 13.0, 12.0, 11.0]],
            vec![vec![19.0, 17.0, 16.0, 15.0], vec![13.0, 11.0, 11.0, 17.0]],
            vec![vec![14.0, 13.0, 12.0, 17.0], vec![11.0, 12.0, 10.0]],
        ];
        let result = two_way_anova_test_impl(&grid, TRIALS, &mut rng).unwrap();
        assert!((result.observed - 0.9333885744278112).abs() < 1e-9);
        // 交互作用は弱いので有意にはならないはず
        assert!(result.p_value > 0.05);
    }

    #[test]
    fn test_chi_squared_independence_test() {
        let mut rng = StdRng::seed_from_u64(105);
        let table = ContingencyTable::from_rows(&[
            vec![20.0, 18.0, 8.0],
            vec![24.0, 24.0, 16.0],
        ])
        .unwrap();
        let result = chi_squared_independence_test_impl(&table, TRIALS, &mut rng).unwrap();
        assert!((result.observed - 0.9679089026915112).abs() < 1e-9);
        // 観測されたカイ二乗は小さいので独立性は棄却されない
        assert!(result.p_value > 0.05);
    }

    #[test]
    fn test_chi_squared_fit_test() {
        let mut rng = StdRng::seed_from_u64(106);
        // 公正なサイコロの期待度数と大きく歪んだ観測度数
        let expected = vec![10.0, 10.0, 10.0, 10.0, 10.0, 10.0];
        let observed = vec![2.0, 3.0, 4.0, 5.0, 6.0, 40.0];
        let result = chi_squared_fit_test_impl(&expected, &observed, TRIALS, &mut rng).unwrap();
        assert!(result.observed > 50.0);
        assert!(result.p_value < 0.01);
    }

    #[test]
    fn test_fishers_exact_test() {
        let mut rng = StdRng::seed_from_u64(107);
        let result = fishers_exact_test_impl(3, 1, 2, 4, TRIALS, &mut rng).unwrap();
        assert!((result.observed - 0.26190476190476186).abs() < 1e-9);
        assert_eq!(result.direction, TailDirection::LessOrEqual);
        assert!(result.p_value > 0.0 && result.p_value <= 1.0);
    }

    #[test]
    fn test_coin_test() {
        let mut rng = StdRng::seed_from_u64(108);
        // 17回中15回表: 公正なコインではめったに起こらない
        let result = coin_test_impl(15, 17, 0.5, TRIALS, &mut rng).unwrap();
        assert!(result.p_value < 0.05);
        // 17回中9回表: ごくありふれた結果
        let result = coin_test_impl(9, 17, 0.5, TRIALS, &mut rng).unwrap();
        assert!(result.p_value > 0.05);

        assert!(coin_test_impl(20, 17, 0.5, TRIALS, &mut rng).is_err());
    }
}
