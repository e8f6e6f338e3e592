// データセットモジュール
//
// リサンプリング手続きが消費するデータモデルを定義します。
// 1次元のグループ列（SampleSet）と2元配置のグリッド（SampleGrid）を
// 暗黙のネスト構造ではなく明示的な型として区別します。

use crate::error::{Error, Result};

/// 1つの実験グループの観測値列
///
/// 読み込み後は不変で、リサンプリングは常に新しい列を生成します。
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    name: Option<String>,
    values: Vec<f64>,
}

impl Sample {
    /// 新しいサンプルを作成
    pub fn new(values: Vec<f64>, name: Option<String>) -> Self {
        Sample { name, values }
    }

    /// グループ名（入力ヘッダ由来）
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// 観測値列への参照
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// 観測値の数
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 平均値を計算
    pub fn mean(&self) -> Result<f64> {
        if self.values.is_empty() {
            return Err(Error::EmptyData("平均値の計算には少なくとも1つのデータが必要です".into()));
        }
        Ok(self.values.iter().sum::<f64>() / self.values.len() as f64)
    }
}

/// k個のグループの順序付き集合
#[derive(Debug, Clone, Default)]
pub struct SampleSet {
    samples: Vec<Sample>,
}

impl SampleSet {
    /// 空のサンプル集合を作成
    pub fn new() -> Self {
        SampleSet { samples: Vec::new() }
    }

    pub fn from_samples(samples: Vec<Sample>) -> Self {
        SampleSet { samples }
    }

    /// グループを末尾に追加
    pub fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// グループ数
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Sample> {
        self.samples.get(index)
    }

    /// 全グループを合わせた観測値の総数
    pub fn pooled_len(&self) -> usize {
        self.samples.iter().map(|s| s.len()).sum()
    }

    /// 値のネストベクトルに変換（リサンプリング内部処理用）
    pub(crate) fn to_groups(&self) -> Vec<Vec<f64>> {
        self.samples.iter().map(|s| s.values.clone()).collect()
    }
}

/// 2元配置（r×c）のグリッド
///
/// 行が要因Aのカテゴリ、列が要因Bのカテゴリに対応します。
/// 入力ヘッダの (行, 列) インデックスに従って疎に構築できますが、
/// 使用前に `validate` で長方形であることを確認します。
#[derive(Debug, Clone, Default)]
pub struct SampleGrid {
    cells: Vec<Vec<Sample>>,
}

impl SampleGrid {
    /// 空のグリッドを作成
    pub fn new() -> Self {
        SampleGrid { cells: Vec::new() }
    }

    /// (row, col) 位置のセルを設定（0始まり）
    ///
    /// 必要に応じて行・列を空サンプルで拡張します。
    pub fn set(&mut self, row: usize, col: usize, sample: Sample) {
        while self.cells.len() <= row {
            self.cells.push(Vec::new());
        }
        while self.cells[row].len() <= col {
            self.cells[row].push(Sample::new(Vec::new(), None));
        }
        self.cells[row][col] = sample;
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Sample> {
        self.cells.get(row).and_then(|r| r.get(col))
    }

    /// 行数（要因Aのカテゴリ数）
    pub fn rows(&self) -> usize {
        self.cells.len()
    }

    /// 列数（要因Bのカテゴリ数）
    pub fn cols(&self) -> usize {
        self.cells.first().map_or(0, |r| r.len())
    }

    /// グリッドが長方形で、全セルが非空であることを確認
    pub fn validate(&self) -> Result<()> {
        if self.cells.is_empty() {
            return Err(Error::EmptyData("グリッドにセルがありません".into()));
        }
        let cols = self.cells[0].len();
        for (r, row) in self.cells.iter().enumerate() {
            if row.len() != cols {
                return Err(Error::DimensionMismatch(format!(
                    "グリッドが長方形ではありません: 行 {} の列数 {}, 期待値 {}",
                    r, row.len(), cols
                )));
            }
            for (c, cell) in row.iter().enumerate() {
                if cell.is_empty() {
                    return Err(Error::EmptyData(format!("グリッドのセル ({}, {}) が空です", r, c)));
                }
            }
        }
        Ok(())
    }

    /// 値のネストベクトルに変換（リサンプリング内部処理用）
    pub(crate) fn to_groups(&self) -> Vec<Vec<Vec<f64>>> {
        self.cells
            .iter()
            .map(|row| row.iter().map(|s| s.values.clone()).collect())
            .collect()
    }
}

/// m×n の分割表
///
/// セルは非負のカウントを行優先で保持します。派生量として
/// 行計・列計・総計・期待度数を提供します。
#[derive(Debug, Clone)]
pub struct ContingencyTable {
    counts: Vec<f64>,
    rows: usize,
    cols: usize,
}

impl ContingencyTable {
    /// 行ベクトルの列から分割表を作成
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::EmptyData("分割表には少なくとも1行が必要です".into()));
        }
        let cols = rows[0].len();
        if cols == 0 {
            return Err(Error::EmptyData("分割表には少なくとも1列が必要です".into()));
        }
        let mut counts = Vec::with_capacity(rows.len() * cols);
        for (r, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(Error::DimensionMismatch(format!(
                    "分割表の行 {} の列数が一致しません: {}, 期待値 {}",
                    r, row.len(), cols
                )));
            }
            for &value in row {
                if value < 0.0 || !value.is_finite() {
                    return Err(Error::InvalidValue(format!("分割表のカウントは非負の有限値である必要があります: {}", value)));
                }
                counts.push(value);
            }
        }
        Ok(ContingencyTable { counts, rows: rows.len(), cols })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// (row, col) 位置のカウント
    pub fn get(&self, row: usize, col: usize) -> Result<f64> {
        if row >= self.rows || col >= self.cols {
            return Err(Error::IndexOutOfBounds {
                index: row * self.cols + col,
                size: self.counts.len(),
            });
        }
        Ok(self.counts[row * self.cols + col])
    }

    /// 行優先のカウント列
    pub fn counts(&self) -> &[f64] {
        &self.counts
    }

    /// 行計
    pub fn row_totals(&self) -> Vec<f64> {
        (0..self.rows)
            .map(|r| self.counts[r * self.cols..(r + 1) * self.cols].iter().sum())
            .collect()
    }

    /// 列計
    pub fn col_totals(&self) -> Vec<f64> {
        (0..self.cols)
            .map(|c| (0..self.rows).map(|r| self.counts[r * self.cols + c]).sum())
            .collect()
    }

    /// 総計
    pub fn grand_total(&self) -> f64 {
        self.counts.iter().sum()
    }

    /// 独立性の仮定の下での期待度数（行優先）
    ///
    /// 期待度数 = 行計 / 総計 × 列計
    pub fn expected(&self) -> Result<Vec<f64>> {
        let total = self.grand_total();
        if total <= 0.0 {
            return Err(Error::ComputationError("分割表の総計が0のため期待度数を計算できません".into()));
        }
        let row_totals = self.row_totals();
        let col_totals = self.col_totals();
        let mut expected = Vec::with_capacity(self.counts.len());
        for r in 0..self.rows {
            for c in 0..self.cols {
                expected.push(row_totals[r] / total * col_totals[c]);
            }
        }
        Ok(expected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_basic() {
        let sample = Sample::new(vec![1.0, 2.0, 3.0], Some("grp".to_string()));
        assert_eq!(sample.len(), 3);
        assert_eq!(sample.name(), Some("grp"));
        assert!((sample.mean().unwrap() - 2.0).abs() < 1e-10);

        // 空のサンプルの平均はエラー
        let empty = Sample::new(vec![], None);
        assert!(empty.mean().is_err());
    }

    #[test]
    fn test_sample_set_pooled_len() {
        let mut set = SampleSet::new();
        set.push(Sample::new(vec![1.0, 2.0], None));
        set.push(Sample::new(vec![3.0, 4.0, 5.0], None));
        assert_eq!(set.len(), 2);
        assert_eq!(set.pooled_len(), 5);
    }

    #[test]
    fn test_grid_set_and_validate() {
        let mut grid = SampleGrid::new();
        // 疎な順序で設定してもグリッドが組み上がる
        grid.set(1, 1, Sample::new(vec![4.0], None));
        grid.set(0, 0, Sample::new(vec![1.0, 2.0], None));
        grid.set(0, 1, Sample::new(vec![3.0], None));
        grid.set(1, 0, Sample::new(vec![5.0, 6.0], None));
        assert_eq!(grid.rows(), 2);
        assert_eq!(grid.cols(), 2);
        assert!(grid.validate().is_ok());
    }

    #[test]
    fn test_grid_validate_empty_cell() {
        let mut grid = SampleGrid::new();
        grid.set(0, 0, Sample::new(vec![1.0], None));
        grid.set(1, 1, Sample::new(vec![2.0], None));
        // (0,1) と (1,0) は空のまま
        assert!(grid.validate().is_err());
    }

    #[test]
    fn test_contingency_table_marginals() {
        let table = ContingencyTable::from_rows(&[
            vec![20.0, 18.0, 8.0],
            vec![24.0, 24.0, 16.0],
        ])
        .unwrap();
        assert_eq!(table.row_totals(), vec![46.0, 64.0]);
        assert_eq!(table.col_totals(), vec![44.0, 42.0, 24.0]);
        assert!((table.grand_total() - 110.0).abs() < 1e-10);

        let expected = table.expected().unwrap();
        assert!((expected[0] - 46.0 / 110.0 * 44.0).abs() < 1e-10);
        assert_eq!(expected.len(), 6);
    }

    #[test]
    fn test_contingency_table_invalid() {
        // 負のカウントは拒否
        assert!(ContingencyTable::from_rows(&[vec![1.0, -2.0]]).is_err());
        // 列数不一致は拒否
        assert!(ContingencyTable::from_rows(&[vec![1.0, 2.0], vec![3.0]]).is_err());
    }
}
