// 入出力モジュール
//
// レコード指向のテキスト形式を読み込みます。`>` で始まる行がグループの
// ヘッダで、続く行に空白区切りの数値を並べます。空行は無視されます。
//
// ```text
// >placebo
// 54 51 58 44 55
// >drug
// 73 70 73 68 65
// ```

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::dataset::{ContingencyTable, Sample, SampleGrid, SampleSet};
use crate::error::{Error, Result};

/// 行から数値列をパース
fn parse_values(line: &str, line_no: usize) -> Result<Vec<f64>> {
    line.split_whitespace()
        .map(|tok| {
            tok.parse::<f64>().map_err(|_| {
                Error::Format(format!("{}行目の数値を解釈できません: '{}'", line_no, tok))
            })
        })
        .collect()
}

/// 1次元グループ列をパース
///
/// `>` ヘッダごとに1つのグループを作り、ファイル内の出現順を保ちます。
pub fn parse_sample_set<R: BufRead>(reader: R) -> Result<SampleSet> {
    let mut set = SampleSet::new();
    let mut name: Option<String> = None;
    let mut values: Vec<f64> = Vec::new();
    let mut seen_header = false;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(header) = trimmed.strip_prefix('>') {
            if seen_header {
                set.push(Sample::new(std::mem::take(&mut values), name.take()));
            }
            seen_header = true;
            let header = header.trim();
            name = if header.is_empty() { None } else { Some(header.to_string()) };
        } else {
            if !seen_header {
                return Err(Error::Format(format!(
                    "{}行目: ヘッダ行（'>' で始まる行）より前にデータ行があります",
                    line_no
                )));
            }
            values.extend(parse_values(trimmed, line_no)?);
        }
    }
    if seen_header {
        set.push(Sample::new(values, name));
    }
    if set.is_empty() {
        return Err(Error::EmptyData("入力にグループが1つもありません".into()));
    }
    Ok(set)
}

/// ファイルから1次元グループ列を読み込み
pub fn read_sample_set<P: AsRef<Path>>(path: P) -> Result<SampleSet> {
    let file = File::open(path)?;
    parse_sample_set(BufReader::new(file))
}

/// ヘッダ末尾の2つの整数を1始まりの (行, 列) として取り出す
fn parse_grid_header(header: &str, line_no: usize) -> Result<(Option<String>, usize, usize)> {
    let tokens: Vec<&str> = header.split_whitespace().collect();
    if tokens.len() < 2 {
        return Err(Error::Format(format!(
            "{}行目: グリッドのヘッダには末尾に (行, 列) の2つの整数が必要です: '{}'",
            line_no, header
        )));
    }
    let parse_index = |tok: &str| -> Result<usize> {
        let raw = tok.parse::<usize>().map_err(|_| {
            Error::Format(format!("{}行目のグリッド添字を解釈できません: '{}'", line_no, tok))
        })?;
        if raw == 0 {
            return Err(Error::Format(format!("{}行目: グリッド添字は1始まりです", line_no)));
        }
        Ok(raw - 1)
    };
    let row = parse_index(tokens[tokens.len() - 2])?;
    let col = parse_index(tokens[tokens.len() - 1])?;
    let name = tokens[..tokens.len() - 2].join(" ");
    let name = if name.is_empty() { None } else { Some(name) };
    Ok((name, row, col))
}

/// 2元配置グリッドをパース
///
/// ヘッダ末尾の2つの整数がセルの (行, 列) 位置を1始まりで指定します。
/// 読み込み後に長方形であることを検証します。
pub fn parse_sample_grid<R: BufRead>(reader: R) -> Result<SampleGrid> {
    let mut grid = SampleGrid::new();
    let mut current: Option<(Option<String>, usize, usize)> = None;
    let mut values: Vec<f64> = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(header) = trimmed.strip_prefix('>') {
            if let Some((name, row, col)) = current.take() {
                grid.set(row, col, Sample::new(std::mem::take(&mut values), name));
            }
            current = Some(parse_grid_header(header.trim(), line_no)?);
        } else {
            if current.is_none() {
                return Err(Error::Format(format!(
                    "{}行目: ヘッダ行（'>' で始まる行）より前にデータ行があります",
                    line_no
                )));
            }
            values.extend(parse_values(trimmed, line_no)?);
        }
    }
    if let Some((name, row, col)) = current {
        grid.set(row, col, Sample::new(values, name));
    }
    grid.validate()?;
    Ok(grid)
}

/// ファイルから2元配置グリッドを読み込み
pub fn read_sample_grid<P: AsRef<Path>>(path: P) -> Result<SampleGrid> {
    let file = File::open(path)?;
    parse_sample_grid(BufReader::new(file))
}

/// 分割表をパース
///
/// ヘッダ行は無視し、非空の各行を分割表の1行として読み込みます。
pub fn parse_table<R: BufRead>(reader: R) -> Result<ContingencyTable> {
    let mut rows: Vec<Vec<f64>> = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('>') {
            continue;
        }
        rows.push(parse_values(trimmed, idx + 1)?);
    }
    ContingencyTable::from_rows(&rows)
}

/// ファイルから分割表を読み込み
pub fn read_table<P: AsRef<Path>>(path: P) -> Result<ContingencyTable> {
    let file = File::open(path)?;
    parse_table(BufReader::new(file))
}
