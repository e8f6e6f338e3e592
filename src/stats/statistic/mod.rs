// 点推定統計量モジュール
//
// リサンプリング検定の対象となる統計量そのものを純関数として実装します。
// ここには乱数は一切現れず、同じ入力には常に同じ値を返します。

use crate::error::{Error, Result};
use crate::stats::RegressionLine;

/// 平均値（呼び出し側で非空を保証すること）
fn mean(vals: &[f64]) -> f64 {
    vals.iter().sum::<f64>() / vals.len() as f64
}

/// 平方和: Σ(x - mean)²
fn sum_of_sq(vals: &[f64], mean: f64) -> f64 {
    vals.iter().map(|&v| (v - mean).powi(2)).sum()
}

/// 重み付き平方和: Σ w·(x - mean)²
fn weighted_sum_of_sq(vals: &[f64], weights: &[f64], mean: f64) -> f64 {
    vals.iter()
        .zip(weights.iter())
        .map(|(&v, &w)| w * (v - mean).powi(2))
        .sum()
}

/// 積和: Σ(x - x̄)(y - ȳ)
fn sum_of_products(x: &[f64], y: &[f64], mean_x: f64, mean_y: f64) -> f64 {
    x.iter()
        .zip(y.iter())
        .map(|(&xi, &yi)| (xi - mean_x) * (yi - mean_y))
        .sum()
}

/// 2群の平均値の差を計算する内部実装
///
/// グループBの平均からグループAの平均を引いた値を返します。
pub(crate) fn mean_diff_impl(a: &[f64], b: &[f64]) -> Result<f64> {
    if a.is_empty() || b.is_empty() {
        return Err(Error::EmptyData("平均値の差の計算には両グループにデータが必要です".into()));
    }
    Ok(mean(b) - mean(a))
}

/// 対データの前提条件を確認（長さ一致・2点以上）
fn check_paired(x: &[f64], y: &[f64], what: &str) -> Result<()> {
    if x.len() != y.len() {
        return Err(Error::DimensionMismatch(format!(
            "{}のデータ長が一致しません: x={}, y={}",
            what,
            x.len(),
            y.len()
        )));
    }
    if x.len() < 2 {
        return Err(Error::InsufficientData(format!("{}には少なくとも2つのデータ対が必要です", what)));
    }
    Ok(())
}

/// ピアソン相関係数を計算する内部実装
pub(crate) fn pearson_r_impl(x: &[f64], y: &[f64]) -> Result<f64> {
    check_paired(x, y, "相関係数計算")?;

    let mean_x = mean(x);
    let mean_y = mean(y);

    let sum_of_prod = sum_of_products(x, y, mean_x, mean_y);
    let sum_of_sq_x = sum_of_sq(x, mean_x);
    let sum_of_sq_y = sum_of_sq(y, mean_y);

    let denominator = (sum_of_sq_x * sum_of_sq_y).sqrt();
    if denominator == 0.0 {
        return Err(Error::ComputationError("相関係数計算: 分散がゼロです".into()));
    }
    Ok(sum_of_prod / denominator)
}

/// 単回帰直線を計算する内部実装
///
/// 傾き b = Σ(x-x̄)(y-ȳ) / Σ(x-x̄)²、切片 a = ȳ - b·x̄
pub(crate) fn regression_line_impl(x: &[f64], y: &[f64]) -> Result<RegressionLine> {
    check_paired(x, y, "回帰直線計算")?;

    let mean_x = mean(x);
    let mean_y = mean(y);

    let sum_of_prod = sum_of_products(x, y, mean_x, mean_y);
    let sum_of_sq_x = sum_of_sq(x, mean_x);
    if sum_of_sq_x == 0.0 {
        return Err(Error::ComputationError("回帰直線計算: xの分散がゼロです".into()));
    }

    let slope = sum_of_prod / sum_of_sq_x;
    let intercept = mean_y - slope * mean_x;
    Ok(RegressionLine { slope, intercept })
}

/// 一元配置分散分析のF統計量を計算する内部実装
///
/// F = (グループ間平方和 / (k-1)) / (グループ内平方和 / (N-k))
pub(crate) fn one_way_f_impl(groups: &[Vec<f64>]) -> Result<f64> {
    if groups.len() < 2 {
        return Err(Error::InsufficientData("分散分析には少なくとも2つのグループが必要です".into()));
    }

    let mut group_means = Vec::with_capacity(groups.len());
    let mut group_counts = Vec::with_capacity(groups.len());
    let mut within_ss = 0.0;
    let mut total_sum = 0.0;
    let mut total_count = 0usize;

    for grp in groups {
        if grp.is_empty() {
            return Err(Error::EmptyData("空のグループがあります".into()));
        }
        let group_mean = mean(grp);
        group_means.push(group_mean);
        group_counts.push(grp.len() as f64);

        total_count += grp.len();
        total_sum += grp.iter().sum::<f64>();

        // グループ内平方和は各グループの平方和の合計
        within_ss += sum_of_sq(grp, group_mean);
    }

    if total_count <= groups.len() {
        return Err(Error::InsufficientData("グループ内自由度が0以下です".into()));
    }

    let total_mean = total_sum / total_count as f64;

    // グループ間平方和はグループ平均の重み付き平方和（重み = グループサイズ）
    let between_ss = weighted_sum_of_sq(&group_means, &group_counts, total_mean);

    let between_df = (groups.len() - 1) as f64;
    let within_df = (total_count - groups.len()) as f64;

    if within_ss == 0.0 {
        return Err(Error::ComputationError("分散分析: グループ内分散がゼロです".into()));
    }

    Ok((between_ss / between_df) / (within_ss / within_df))
}

/// 二元配置分散分析の交互作用F統計量を計算する内部実装
///
/// 行を要因A、列を要因Bのカテゴリとして、
/// F = (交互作用平方和 / 交互作用自由度) / (グループ内平方和 / グループ内自由度)
pub(crate) fn two_way_f_impl(grid: &[Vec<Vec<f64>>]) -> Result<f64> {
    let num_rows = grid.len();
    if num_rows < 2 {
        return Err(Error::InsufficientData("二元配置分散分析には要因Aに少なくとも2カテゴリが必要です".into()));
    }
    let num_cols = grid[0].len();
    if num_cols < 2 {
        return Err(Error::InsufficientData("二元配置分散分析には要因Bに少なくとも2カテゴリが必要です".into()));
    }

    let mut all_vals: Vec<f64> = Vec::new();
    let mut factor_a: Vec<Vec<f64>> = vec![Vec::new(); num_rows];
    let mut factor_b: Vec<Vec<f64>> = vec![Vec::new(); num_cols];
    let mut within_ss = 0.0;
    let mut total_sum = 0.0;
    let mut total_count = 0usize;

    for (r, row) in grid.iter().enumerate() {
        if row.len() != num_cols {
            return Err(Error::DimensionMismatch(format!(
                "グリッドが長方形ではありません: 行 {} の列数 {}, 期待値 {}",
                r,
                row.len(),
                num_cols
            )));
        }
        for (c, grp) in row.iter().enumerate() {
            if grp.is_empty() {
                return Err(Error::EmptyData(format!("グリッドのセル ({}, {}) が空です", r, c)));
            }
            let group_mean = mean(grp);

            all_vals.extend_from_slice(grp);
            factor_a[r].extend_from_slice(grp);
            factor_b[c].extend_from_slice(grp);

            total_count += grp.len();
            total_sum += grp.iter().sum::<f64>();

            within_ss += sum_of_sq(grp, group_mean);
        }
    }

    let num_groups = num_rows * num_cols;
    if total_count <= num_groups {
        return Err(Error::InsufficientData("グループ内自由度が0以下です".into()));
    }

    let total_mean = total_sum / total_count as f64;
    let total_ss = sum_of_sq(&all_vals, total_mean);

    // 要因ごとの平方和はカテゴリ平均の重み付き平方和（重み = カテゴリの観測数）
    let factor_a_means: Vec<f64> = factor_a.iter().map(|v| mean(v)).collect();
    let factor_a_weights: Vec<f64> = factor_a.iter().map(|v| v.len() as f64).collect();
    let factor_a_ss = weighted_sum_of_sq(&factor_a_means, &factor_a_weights, total_mean);

    let factor_b_means: Vec<f64> = factor_b.iter().map(|v| mean(v)).collect();
    let factor_b_weights: Vec<f64> = factor_b.iter().map(|v| v.len() as f64).collect();
    let factor_b_ss = weighted_sum_of_sq(&factor_b_means, &factor_b_weights, total_mean);

    let between_ss = total_ss - within_ss;
    let interaction_ss = between_ss - (factor_a_ss + factor_b_ss);

    let between_df = num_groups - 1;
    let within_df = total_count - num_groups;
    let factor_a_df = num_rows - 1;
    let factor_b_df = num_cols - 1;
    let interaction_df = between_df - factor_a_df - factor_b_df;

    if interaction_df == 0 {
        return Err(Error::ComputationError("二元配置分散分析: 交互作用自由度が0です".into()));
    }
    if within_ss == 0.0 {
        return Err(Error::ComputationError("二元配置分散分析: グループ内分散がゼロです".into()));
    }

    let within_var = within_ss / within_df as f64;
    let interaction_var = interaction_ss / interaction_df as f64;
    Ok(interaction_var / within_var)
}

/// カイ二乗統計量を計算する内部実装
///
/// Σ (観測値 - 期待値)² / 期待値
pub(crate) fn chi_squared_impl(expected: &[f64], observed: &[f64]) -> Result<f64> {
    if expected.len() != observed.len() {
        return Err(Error::DimensionMismatch(format!(
            "カイ二乗計算のカテゴリ数が一致しません: 期待値 {}, 観測値 {}",
            expected.len(),
            observed.len()
        )));
    }
    if expected.is_empty() {
        return Err(Error::EmptyData("カイ二乗計算にはデータが必要です".into()));
    }

    let mut total = 0.0;
    for (&e, &o) in expected.iter().zip(observed.iter()) {
        if e == 0.0 {
            return Err(Error::ComputationError("カイ二乗計算: 期待度数がゼロのカテゴリがあります".into()));
        }
        total += (o - e).powi(2) / e;
    }
    Ok(total)
}

/// ln(n!) を計算
///
/// 大きな分割表でも桁あふれしないよう、階乗は対数空間で扱います。
fn ln_factorial(n: u64) -> f64 {
    (1..=n).map(|i| (i as f64).ln()).sum()
}

/// 特定の2×2分割表が得られる超幾何確率
///
/// (a+b)!(c+d)!(a+c)!(b+d)! / (a!b!c!d!n!)
pub(crate) fn table_probability(a: u64, b: u64, c: u64, d: u64) -> f64 {
    let n = a + b + c + d;
    let ln_prob = ln_factorial(a + b) + ln_factorial(c + d) + ln_factorial(a + c)
        + ln_factorial(b + d)
        - ln_factorial(a)
        - ln_factorial(b)
        - ln_factorial(c)
        - ln_factorial(d)
        - ln_factorial(n);
    ln_prob.exp()
}

/// フィッシャーの正確検定の片側裾確率を計算する内部実装
///
/// 周辺度数を保ったまま取りうる全ての表のうち、
/// a' + d' ≥ a + d（観測と同等かそれ以上に「極端」）な表の確率を合計します。
pub(crate) fn fishers_exact_impl(a: u64, b: u64, c: u64, d: u64) -> Result<f64> {
    let n = a + b + c + d;
    if n == 0 {
        return Err(Error::EmptyData("フィッシャーの正確検定には正の総計が必要です".into()));
    }

    let mut prob_tail = 0.0;
    for a_prime in 0..=n {
        // 周辺度数から残りのセルが一意に決まる。負になる組み合わせは存在しない表
        let b_prime = match (a + b).checked_sub(a_prime) {
            Some(v) => v,
            None => continue,
        };
        let c_prime = match (a + c).checked_sub(a_prime) {
            Some(v) => v,
            None => continue,
        };
        let d_prime = match (c + d).checked_sub(c_prime) {
            Some(v) => v,
            None => continue,
        };
        if a_prime + d_prime >= a + d {
            prob_tail += table_probability(a_prime, b_prime, c_prime, d_prime);
        }
    }
    Ok(prob_tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_diff() {
        let placebo = vec![54.0, 51.0, 58.0, 44.0, 55.0, 52.0, 42.0, 47.0, 58.0, 46.0];
        let drug = vec![54.0, 73.0, 53.0, 70.0, 73.0, 68.0, 52.0, 65.0, 65.0];
        let diff = mean_diff_impl(&placebo, &drug).unwrap();
        assert!((diff - 12.966666666666661).abs() < 1e-9);

        assert!(mean_diff_impl(&[], &drug).is_err());
    }

    #[test]
    fn test_pearson_r() {
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let y = vec![2.0, 4.0, 6.0, 8.0, 10.0];
        assert!((pearson_r_impl(&x, &y).unwrap() - 1.0).abs() < 1e-10);

        let y_neg = vec![10.0, 8.0, 6.0, 4.0, 2.0];
        assert!((pearson_r_impl(&x, &y_neg).unwrap() + 1.0).abs() < 1e-10);

        // 分散ゼロはエラー
        let y_const = vec![3.0, 3.0, 3.0, 3.0, 3.0];
        assert!(pearson_r_impl(&x, &y_const).is_err());
        // 長さ不一致はエラー
        assert!(pearson_r_impl(&x, &[1.0]).is_err());
    }

    #[test]
    fn test_regression_line() {
        let x = vec![
            1350.0, 1510.0, 1420.0, 1210.0, 1250.0, 1300.0, 1580.0, 1310.0, 1290.0, 1320.0,
            1490.0, 1200.0, 1360.0,
        ];
        let y = vec![3.6, 3.8, 3.7, 3.3, 3.9, 3.4, 3.8, 3.7, 3.5, 3.4, 3.8, 3.0, 3.1];
        let line = regression_line_impl(&x, &y).unwrap();
        assert!((line.slope - 0.0014080270702133654).abs() < 1e-12);
        assert!((line.intercept - 1.6332926026882233).abs() < 1e-9);
    }

    #[test]
    fn test_one_way_f() {
        let groups = vec![
            vec![45.0, 44.0, 34.0, 33.0, 45.0, 46.0, 34.0],
            vec![34.0, 34.0, 50.0, 49.0, 48.0, 39.0, 45.0],
            vec![24.0, 34.0, 23.0, 25.0, 36.0, 28.0, 33.0, 29.0],
        ];
        let f = one_way_f_impl(&groups).unwrap();
        assert!((f - 11.271756509821838).abs() < 1e-9);

        // グループが1つではエラー
        assert!(one_way_f_impl(&groups[..1].to_vec()).is_err());
        // グループ内分散ゼロはエラー
        let degenerate = vec![vec![1.0, 1.0], vec![2.0, 2.0]];
        assert!(one_way_f_impl(&degenerate).is_err());
    }

    #[test]
    fn test_two_way_f() {
        let grid = vec![
            vec![vec![15.0, 12.0, 13.0, 16.0], vec![13.0, 13.0, 12.0, 11.0]],
            vec![vec![19.0, 17.0, 16.0, 15.0], vec![13.0, 11.0, 11.0, 17.0]],
            vec![vec![14.0, 13.0, 12.0, 17.0], vec![11.0, 12.0, 10.0]],
        ];
        let f = two_way_f_impl(&grid).unwrap();
        assert!((f - 0.9333885744278112).abs() < 1e-9);
    }

    #[test]
    fn test_two_way_f_not_rectangular() {
        let grid = vec![
            vec![vec![1.0, 2.0], vec![3.0, 4.0]],
            vec![vec![5.0, 6.0]],
        ];
        assert!(two_way_f_impl(&grid).is_err());
    }

    #[test]
    fn test_chi_squared() {
        // 健康/貧富の例: 観測 [20,18,8,24,24,16]、周辺度数由来の期待度数
        let observed = vec![20.0, 18.0, 8.0, 24.0, 24.0, 16.0];
        let row_totals = [46.0, 64.0];
        let col_totals = [44.0, 42.0, 24.0];
        let total = 110.0;
        let expected: Vec<f64> = (0..2)
            .flat_map(|r| (0..3).map(move |c| row_totals[r] / total * col_totals[c]))
            .collect();
        let chi2 = chi_squared_impl(&expected, &observed).unwrap();
        assert!((chi2 - 0.9679089026915112).abs() < 1e-9);

        // 期待度数ゼロはエラー
        assert!(chi_squared_impl(&[0.0, 1.0], &[1.0, 1.0]).is_err());
    }

    #[test]
    fn test_table_probability() {
        // ((3+1)!(2+4)!(3+2)!(1+4)!) / (3!1!2!4!10!) = 10/42
        let p = table_probability(3, 1, 2, 4);
        assert!((p - 10.0 / 42.0).abs() < 1e-10);
    }

    #[test]
    fn test_fishers_exact() {
        // お茶の試飲の例: 片側裾確率は 0.2619
        let p = fishers_exact_impl(3, 1, 2, 4).unwrap();
        assert!((p - 0.26190476190476186).abs() < 1e-9);
    }

    #[test]
    fn test_fishers_exact_large_counts() {
        // 階乗が u64 を超える規模でも対数空間なので桁あふれしない
        let p = fishers_exact_impl(30, 10, 20, 40).unwrap();
        assert!(p.is_finite());
        assert!(p > 0.0 && p <= 1.0);
    }

    #[test]
    fn test_statistics_are_deterministic() {
        let x = vec![1.0, 2.0, 3.0, 4.0];
        let y = vec![1.5, 2.5, 3.0, 4.5];
        let first = pearson_r_impl(&x, &y).unwrap();
        for _ in 0..10 {
            assert_eq!(pearson_r_impl(&x, &y).unwrap(), first);
        }
    }
}
