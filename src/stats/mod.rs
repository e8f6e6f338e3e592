// 統計モジュール
//
// リサンプリングに基づく統計的推測を提供します。
// 並べ替え（シャッフル）による有意性検定と、ブートストラップによる
// 信頼区間（バイアス補正付きを含む）が実装されています。

pub mod interval;
pub mod normal;
pub mod resample;
pub mod significance;
pub mod statistic;

use crate::dataset::{ContingencyTable, SampleGrid, SampleSet};
use crate::error::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;

pub use normal::{area_to_sd, sd_to_area};

/// リサンプリング試行回数の既定値
pub const DEFAULT_TRIALS: usize = 10_000;

/// 信頼水準の既定値（90%信頼区間）
pub const DEFAULT_LEVEL: f64 = 0.9;

/// 裾確率の比較方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TailDirection {
    /// 観測値以上を数える（F統計量・カイ二乗・正の差など）
    GreaterOrEqual,
    /// 観測値以下を数える（負の差・フィッシャーの裾確率など）
    LessOrEqual,
}

/// 有意性検定の結果
#[derive(Debug, Clone)]
pub struct SignificanceResult {
    /// 観測された統計量
    pub observed: f64,
    /// 観測値と同等かそれ以上に極端だった試行の数
    pub count: usize,
    /// 試行回数
    pub trials: usize,
    /// 経験的な裾確率（count / trials）
    pub p_value: f64,
    /// 比較方向
    pub direction: TailDirection,
}

/// ブートストラップ信頼区間の結果
///
/// 素朴なパーセンタイル区間とバイアス補正付き区間は
/// 同じソート済み分布から取り出されます。
#[derive(Debug, Clone)]
pub struct IntervalResult {
    /// 観測された統計量
    pub observed: f64,
    /// 信頼水準
    pub level: f64,
    /// 試行回数
    pub trials: usize,
    /// 素朴な区間の下限
    pub lower: f64,
    /// 素朴な区間の上限
    pub upper: f64,
    /// バイアス補正付き区間の下限
    pub corrected_lower: f64,
    /// バイアス補正付き区間の上限
    pub corrected_upper: f64,
}

/// 単回帰直線 y' = slope·x + intercept
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionLine {
    /// 傾き
    pub slope: f64,
    /// 切片
    pub intercept: f64,
}

// ---------------------------------------------------------------------------
// 点推定統計量
// ---------------------------------------------------------------------------

/// 2群の平均値の差を計算
///
/// # 説明
/// グループBの平均からグループAの平均を引いた値を返します。
///
/// # 例
/// ```rust
/// use resamprs::stats;
///
/// let a = vec![1.0, 2.0, 3.0];
/// let b = vec![4.0, 5.0, 6.0];
/// let diff = stats::mean_difference(&a, &b).unwrap();
/// assert!((diff - 3.0).abs() < 1e-10);
/// ```
pub fn mean_difference<T: AsRef<[f64]>, U: AsRef<[f64]>>(a: T, b: U) -> Result<f64> {
    statistic::mean_diff_impl(a.as_ref(), b.as_ref())
}

/// ピアソン相関係数を計算
///
/// # 例
/// ```rust
/// use resamprs::stats;
///
/// let x = vec![1.0, 2.0, 3.0, 4.0, 5.0];
/// let y = vec![2.0, 4.0, 6.0, 8.0, 10.0];
/// let r = stats::pearson_r(&x, &y).unwrap();
/// assert!((r - 1.0).abs() < 1e-10);
/// ```
pub fn pearson_r<T: AsRef<[f64]>, U: AsRef<[f64]>>(x: T, y: U) -> Result<f64> {
    statistic::pearson_r_impl(x.as_ref(), y.as_ref())
}

/// 最小二乗法による単回帰直線を計算
pub fn regression_line<T: AsRef<[f64]>, U: AsRef<[f64]>>(x: T, y: U) -> Result<RegressionLine> {
    statistic::regression_line_impl(x.as_ref(), y.as_ref())
}

/// 一元配置分散分析のF統計量を計算
pub fn one_way_f(groups: &SampleSet) -> Result<f64> {
    statistic::one_way_f_impl(&groups.to_groups())
}

/// 二元配置分散分析の交互作用F統計量を計算
pub fn two_way_f(grid: &SampleGrid) -> Result<f64> {
    statistic::two_way_f_impl(&grid.to_groups())
}

/// カイ二乗統計量を計算
///
/// # 例
/// ```rust
/// use resamprs::stats;
///
/// let expected = vec![10.0, 10.0, 10.0];
/// let observed = vec![8.0, 12.0, 10.0];
/// let chi2 = stats::chi_squared(&expected, &observed).unwrap();
/// assert!((chi2 - 0.8).abs() < 1e-10);
/// ```
pub fn chi_squared<T: AsRef<[f64]>, U: AsRef<[f64]>>(expected: T, observed: U) -> Result<f64> {
    statistic::chi_squared_impl(expected.as_ref(), observed.as_ref())
}

/// フィッシャーの正確検定の片側裾確率を計算
///
/// 2×2分割表
/// ```text
/// a b
/// c d
/// ```
/// に対し、同じ周辺度数を持つ表のうち a' + d' ≥ a + d となるものの
/// 超幾何確率の合計を返します。
pub fn fishers_exact_probability(a: u64, b: u64, c: u64, d: u64) -> Result<f64> {
    statistic::fishers_exact_impl(a, b, c, d)
}

// ---------------------------------------------------------------------------
// リサンプリング
// ---------------------------------------------------------------------------

/// グループをプールしてシャッフルし、元のサイズに再分割
///
/// 値の多重集合と各グループのサイズは保存されます。
pub fn shuffle_groups(groups: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let mut rng = StdRng::from_entropy();
    resample::shuffle_groups_impl(groups, &mut rng)
}

/// 周辺度数を保存したランダムな分割表を生成（行優先）
pub fn shuffle_table(row_totals: &[u64], col_totals: &[u64]) -> Result<Vec<u64>> {
    let mut rng = StdRng::from_entropy();
    resample::shuffle_table_impl(row_totals, col_totals, &mut rng)
}

/// 復元抽出によるブートストラップ標本を生成
pub fn bootstrap<T: AsRef<[f64]>>(data: T) -> Result<Vec<f64>> {
    let mut rng = StdRng::from_entropy();
    resample::bootstrap_impl(data.as_ref(), &mut rng)
}

/// 対を保ったブートストラップ標本を生成
///
/// 位置ごとに1つのインデックスを引いて両方の配列に適用するため、
/// (x, y) の対応関係が保存されます。
pub fn bootstrap_paired<T: AsRef<[f64]>, U: AsRef<[f64]>>(
    x: T,
    y: U,
) -> Result<(Vec<f64>, Vec<f64>)> {
    let mut rng = StdRng::from_entropy();
    resample::bootstrap_paired_impl(x.as_ref(), y.as_ref(), &mut rng)
}

// ---------------------------------------------------------------------------
// 有意性検定（並べ替え検定）
// ---------------------------------------------------------------------------

/// 2群の平均値の差の並べ替え検定を実行
///
/// # 説明
/// 両グループの値をプールしてシャッフルし、元のサイズに再分割して
/// 差を再計算する試行を10,000回行い、観測された差と同等かそれ以上に
/// 極端な差が偶然得られる確率を推定します。
///
/// # 例
/// ```rust
/// use resamprs::stats;
///
/// let placebo = vec![54.0, 51.0, 58.0, 44.0, 55.0];
/// let drug = vec![73.0, 70.0, 73.0, 68.0, 65.0];
/// let result = stats::mean_difference_test(&placebo, &drug).unwrap();
/// assert!(result.p_value <= 1.0);
/// ```
pub fn mean_difference_test<T: AsRef<[f64]>, U: AsRef<[f64]>>(
    a: T,
    b: U,
) -> Result<SignificanceResult> {
    let mut rng = StdRng::from_entropy();
    significance::mean_diff_test_impl(a.as_ref(), b.as_ref(), DEFAULT_TRIALS, &mut rng)
}

/// ピアソン相関係数の並べ替え検定を実行
pub fn correlation_test<T: AsRef<[f64]>, U: AsRef<[f64]>>(
    x: T,
    y: U,
) -> Result<SignificanceResult> {
    let mut rng = StdRng::from_entropy();
    significance::correlation_test_impl(x.as_ref(), y.as_ref(), DEFAULT_TRIALS, &mut rng)
}

/// 回帰直線の傾きの並べ替え検定を実行
pub fn regression_test<T: AsRef<[f64]>, U: AsRef<[f64]>>(
    x: T,
    y: U,
) -> Result<SignificanceResult> {
    let mut rng = StdRng::from_entropy();
    significance::regression_test_impl(x.as_ref(), y.as_ref(), DEFAULT_TRIALS, &mut rng)
}

/// 一元配置分散分析の並べ替え検定を実行
pub fn one_way_anova_test(groups: &SampleSet) -> Result<SignificanceResult> {
    let mut rng = StdRng::from_entropy();
    significance::one_way_anova_test_impl(&groups.to_groups(), DEFAULT_TRIALS, &mut rng)
}

/// 二元配置分散分析（交互作用）の並べ替え検定を実行
pub fn two_way_anova_test(grid: &SampleGrid) -> Result<SignificanceResult> {
    let mut rng = StdRng::from_entropy();
    significance::two_way_anova_test_impl(&grid.to_groups(), DEFAULT_TRIALS, &mut rng)
}

/// カイ二乗適合度検定（1変数）を実行
pub fn chi_squared_fit_test<T: AsRef<[f64]>, U: AsRef<[f64]>>(
    expected: T,
    observed: U,
) -> Result<SignificanceResult> {
    let mut rng = StdRng::from_entropy();
    significance::chi_squared_fit_test_impl(
        expected.as_ref(),
        observed.as_ref(),
        DEFAULT_TRIALS,
        &mut rng,
    )
}

/// カイ二乗独立性検定（多変数）を実行
///
/// 期待度数は観測表の周辺度数から求め、各試行では周辺度数を保存した
/// ランダムな分割表と比較します。
pub fn chi_squared_independence_test(table: &ContingencyTable) -> Result<SignificanceResult> {
    let mut rng = StdRng::from_entropy();
    significance::chi_squared_independence_test_impl(table, DEFAULT_TRIALS, &mut rng)
}

/// フィッシャーの正確検定の並べ替え検定を実行
pub fn fishers_exact_test(a: u64, b: u64, c: u64, d: u64) -> Result<SignificanceResult> {
    let mut rng = StdRng::from_entropy();
    significance::fishers_exact_test_impl(a, b, c, d, DEFAULT_TRIALS, &mut rng)
}

/// コインの公正さの検定を実行
///
/// # 例
/// ```rust
/// use resamprs::stats;
///
/// // 17回中15回表が出た場合、公正なコインと言えるか
/// let result = stats::coin_test(15, 17, 0.5).unwrap();
/// assert!(result.p_value <= 1.0);
/// ```
pub fn coin_test(heads: usize, tosses: usize, p: f64) -> Result<SignificanceResult> {
    let mut rng = StdRng::from_entropy();
    significance::coin_test_impl(heads, tosses, p, DEFAULT_TRIALS, &mut rng)
}

// ---------------------------------------------------------------------------
// 信頼区間（ブートストラップ）
// ---------------------------------------------------------------------------

/// 2群の平均値の差の信頼区間を計算
///
/// # 説明
/// 各グループを独立にブートストラップして差を再計算する試行を
/// 10,000回行い、ソートした分布から素朴なパーセンタイル区間と
/// バイアス補正付き区間の両方を取り出します。
pub fn mean_difference_interval<T: AsRef<[f64]>, U: AsRef<[f64]>>(
    a: T,
    b: U,
    level: f64,
) -> Result<IntervalResult> {
    let mut rng = StdRng::from_entropy();
    interval::mean_diff_interval_impl(a.as_ref(), b.as_ref(), level, DEFAULT_TRIALS, &mut rng)
}

/// ピアソン相関係数の信頼区間を計算（対ブートストラップ）
pub fn correlation_interval<T: AsRef<[f64]>, U: AsRef<[f64]>>(
    x: T,
    y: U,
    level: f64,
) -> Result<IntervalResult> {
    let mut rng = StdRng::from_entropy();
    interval::correlation_interval_impl(x.as_ref(), y.as_ref(), level, DEFAULT_TRIALS, &mut rng)
}

/// 回帰直線の傾きの信頼区間を計算（対ブートストラップ）
pub fn regression_interval<T: AsRef<[f64]>, U: AsRef<[f64]>>(
    x: T,
    y: U,
    level: f64,
) -> Result<IntervalResult> {
    let mut rng = StdRng::from_entropy();
    interval::regression_interval_impl(x.as_ref(), y.as_ref(), level, DEFAULT_TRIALS, &mut rng)
}

/// 一元配置分散分析のF統計量の信頼区間を計算
pub fn one_way_anova_interval(groups: &SampleSet, level: f64) -> Result<IntervalResult> {
    let mut rng = StdRng::from_entropy();
    interval::one_way_anova_interval_impl(&groups.to_groups(), level, DEFAULT_TRIALS, &mut rng)
}

/// 二元配置分散分析（交互作用F）の信頼区間を計算
pub fn two_way_anova_interval(grid: &SampleGrid, level: f64) -> Result<IntervalResult> {
    let mut rng = StdRng::from_entropy();
    interval::two_way_anova_interval_impl(&grid.to_groups(), level, DEFAULT_TRIALS, &mut rng)
}
