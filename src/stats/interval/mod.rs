// ブートストラップ信頼区間モジュール
//
// リサンプリング→統計量の再計算を既定で10,000回繰り返して分布を作り、
// ソート後に素朴なパーセンタイル区間とバイアス補正付き区間の両方を
// 同じ分布から取り出します。

use crate::error::{Error, Result};
use crate::stats::normal::{area_to_sd, sd_to_area};
use crate::stats::resample::{bootstrap_impl, bootstrap_paired_impl};
use crate::stats::statistic::{
    mean_diff_impl, one_way_f_impl, pearson_r_impl, regression_line_impl, two_way_f_impl,
};
use crate::stats::IntervalResult;
use rand::Rng;

/// 区間の添字を有効範囲 [0, trials-1] に収める
///
/// 元の手続きは添字を範囲に収めておらず、分布の偏りが極端な場合に
/// 範囲外アクセスになりうるため、ここで防御的に丸めます。
fn clamp_index(raw: f64, trials: usize) -> usize {
    if raw <= 0.0 {
        return 0;
    }
    (raw as usize).min(trials - 1)
}

/// ブートストラップ分布を構築して両方の区間を取り出す共通エンジン
///
/// `resampled_stat` は1回のリサンプリングに対する統計量を返すクロージャです。
pub(crate) fn bootstrap_interval_impl<R, F>(
    observed: f64,
    level: f64,
    trials: usize,
    rng: &mut R,
    mut resampled_stat: F,
) -> Result<IntervalResult>
where
    R: Rng,
    F: FnMut(&mut R) -> Result<f64>,
{
    if level <= 0.0 || level >= 1.0 {
        return Err(Error::InvalidValue(format!(
            "信頼水準は (0, 1) の範囲である必要があります: {}",
            level
        )));
    }
    if trials == 0 {
        return Err(Error::InvalidValue("試行回数は正の値である必要があります".into()));
    }

    let mut out = Vec::with_capacity(trials);
    // バイアス補正のため、観測値を下回ったリサンプル値の個数を数えておく
    let mut num_below_observed = 0usize;
    for _ in 0..trials {
        let stat = resampled_stat(rng)?;
        if stat < observed {
            num_below_observed += 1;
        }
        out.push(stat);
    }
    out.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let n = trials as f64;

    // 素朴なパーセンタイル区間。端数は区間が狭まる方向に丸め、
    // 信頼水準を下回らないようにする
    let tails = (1.0 - level) / 2.0;
    let lower = clamp_index((n * tails).ceil(), trials);
    let upper = clamp_index((n * (1.0 - tails)).floor(), trials);

    // バイアス補正付き区間。観測値を下回る割合が0.5からどれだけ
    // ずれているかを正規分布のsdに写し、両端をその2倍だけずらす
    let p = num_below_observed as f64 / n;
    let z_0 = area_to_sd(p - 0.5);
    let tail_sds = area_to_sd(level / 2.0);
    let corrected_lower = clamp_index((n * (0.5 + sd_to_area(-tail_sds + 2.0 * z_0))).ceil(), trials);
    let corrected_upper = clamp_index((n * (0.5 + sd_to_area(tail_sds + 2.0 * z_0))).floor(), trials);

    Ok(IntervalResult {
        observed,
        level,
        trials,
        lower: out[lower],
        upper: out[upper],
        corrected_lower: out[corrected_lower],
        corrected_upper: out[corrected_upper],
    })
}

/// 2群の平均値の差の信頼区間の内部実装
///
/// 各グループを独立にブートストラップします。
pub(crate) fn mean_diff_interval_impl<R: Rng>(
    a: &[f64],
    b: &[f64],
    level: f64,
    trials: usize,
    rng: &mut R,
) -> Result<IntervalResult> {
    let observed = mean_diff_impl(a, b)?;
    bootstrap_interval_impl(observed, level, trials, rng, |rng| {
        let boot_a = bootstrap_impl(a, rng)?;
        let boot_b = bootstrap_impl(b, rng)?;
        mean_diff_impl(&boot_a, &boot_b)
    })
}

/// ピアソン相関係数の信頼区間の内部実装
///
/// (x, y) の対応を保つため対ブートストラップを使います。
pub(crate) fn correlation_interval_impl<R: Rng>(
    x: &[f64],
    y: &[f64],
    level: f64,
    trials: usize,
    rng: &mut R,
) -> Result<IntervalResult> {
    let observed = pearson_r_impl(x, y)?;
    bootstrap_interval_impl(observed, level, trials, rng, |rng| {
        let (boot_x, boot_y) = bootstrap_paired_impl(x, y, rng)?;
        pearson_r_impl(&boot_x, &boot_y)
    })
}

/// 回帰直線の傾きの信頼区間の内部実装
pub(crate) fn regression_interval_impl<R: Rng>(
    x: &[f64],
    y: &[f64],
    level: f64,
    trials: usize,
    rng: &mut R,
) -> Result<IntervalResult> {
    let observed = regression_line_impl(x, y)?.slope;
    bootstrap_interval_impl(observed, level, trials, rng, |rng| {
        let (boot_x, boot_y) = bootstrap_paired_impl(x, y, rng)?;
        Ok(regression_line_impl(&boot_x, &boot_y)?.slope)
    })
}

/// 一元配置分散分析のF統計量の信頼区間の内部実装
pub(crate) fn one_way_anova_interval_impl<R: Rng>(
    groups: &[Vec<f64>],
    level: f64,
    trials: usize,
    rng: &mut R,
) -> Result<IntervalResult> {
    let observed = one_way_f_impl(groups)?;
    bootstrap_interval_impl(observed, level, trials, rng, |rng| {
        let boot_groups = groups
            .iter()
            .map(|grp| bootstrap_impl(grp, rng))
            .collect::<Result<Vec<_>>>()?;
        one_way_f_impl(&boot_groups)
    })
}

/// 二元配置分散分析（交互作用F）の信頼区間の内部実装
pub(crate) fn two_way_anova_interval_impl<R: Rng>(
    grid: &[Vec<Vec<f64>>],
    level: f64,
    trials: usize,
    rng: &mut R,
) -> Result<IntervalResult> {
    let observed = two_way_f_impl(grid)?;
    bootstrap_interval_impl(observed, level, trials, rng, |rng| {
        let boot_grid = grid
            .iter()
            .map(|row| {
                row.iter()
                    .map(|grp| bootstrap_impl(grp, rng))
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;
        two_way_f_impl(&boot_grid)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const TRIALS: usize = 2000;

    #[test]
    fn test_mean_diff_interval_contains_observed() {
        let mut rng = StdRng::seed_from_u64(200);
        let placebo = vec![54.0, 51.0, 58.0, 44.0, 55.0, 52.0, 42.0, 47.0, 58.0, 46.0];
        let drug = vec![54.0, 73.0, 53.0, 70.0, 73.0, 68.0, 52.0, 65.0, 65.0];
        let result = mean_diff_interval_impl(&placebo, &drug, 0.9, TRIALS, &mut rng).unwrap();
        assert!((result.observed - 12.966666666666661).abs() < 1e-9);
        // ブートストラップ分布は観測値を中心に広がる
        assert!(result.lower <= result.upper);
        assert!(result.lower < result.observed && result.observed < result.upper);
        assert!(result.corrected_lower <= result.corrected_upper);
    }

    #[test]
    fn test_regression_interval() {
        let mut rng = StdRng::seed_from_u64(201);
        let x = vec![
            1350.0, 1510.0, 1420.0, 1210.0, 1250.0, 1300.0, 1580.0, 1310.0, 1290.0, 1320.0,
            1490.0, 1200.0, 1360.0,
        ];
        let y = vec![3.6, 3.8, 3.7, 3.3, 3.9, 3.4, 3.8, 3.7, 3.5, 3.4, 3.8, 3.0, 3.1];
        let result = regression_interval_impl(&x, &y, 0.9, TRIALS, &mut rng).unwrap();
        assert!((result.observed - 0.0014080270702133654).abs() < 1e-12);
        assert!(result.lower < result.observed && result.observed < result.upper);
        // バイアス補正後も区間の向きは保たれる
        assert!(result.corrected_lower <= result.corrected_upper);
    }

    #[test]
    fn test_correlation_interval_bounds() {
        let mut rng = StdRng::seed_from_u64(202);
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        let y = vec![1.2, 2.1, 2.9, 4.3, 5.1, 5.8, 7.2, 8.1, 8.8, 10.2];
        let result = correlation_interval_impl(&x, &y, 0.9, TRIALS, &mut rng).unwrap();
        // 相関係数の区間は定義域 [-1, 1] に収まる
        assert!(result.lower >= -1.0 && result.upper <= 1.0);
        assert!(result.corrected_lower >= -1.0 && result.corrected_upper <= 1.0);
    }

    #[test]
    fn test_one_way_anova_interval() {
        let mut rng = StdRng::seed_from_u64(203);
        let groups = vec![
            vec![45.0, 44.0, 34.0, 33.0, 45.0, 46.0, 34.0],
            vec![34.0, 34.0, 50.0, 49.0, 48.0, 39.0, 45.0],
            vec![24.0, 34.0, 23.0, 25.0, 36.0, 28.0, 33.0, 29.0],
        ];
        let result = one_way_anova_interval_impl(&groups, 0.9, TRIALS, &mut rng).unwrap();
        assert!((result.observed - 11.271756509821838).abs() < 1e-9);
        // F統計量は非負
        assert!(result.lower >= 0.0);
        assert!(result.lower <= result.upper);
    }

    #[test]
    fn test_interval_invalid_level() {
        let mut rng = StdRng::seed_from_u64(204);
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![4.0, 5.0, 6.0];
        assert!(mean_diff_interval_impl(&a, &b, 0.0, TRIALS, &mut rng).is_err());
        assert!(mean_diff_interval_impl(&a, &b, 1.0, TRIALS, &mut rng).is_err());
    }

    #[test]
    fn test_index_clamping_under_extreme_skew() {
        let mut rng = StdRng::seed_from_u64(205);
        // 観測値が分布の完全に外側にあっても、補正後の添字は
        // 範囲外アクセスを起こさず、返る値は分布の中から取られる
        for observed in [-100.0, 100.0] {
            let result =
                bootstrap_interval_impl(observed, 0.9, 500, &mut rng, |rng| {
                    Ok(rng.gen_range(0.0..1.0))
                })
                .unwrap();
            assert!((0.0..1.0).contains(&result.corrected_lower));
            assert!((0.0..1.0).contains(&result.corrected_upper));
        }
    }
}
