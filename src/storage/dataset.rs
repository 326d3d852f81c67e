//! Partitioned parquet dataset.
//!
//! Layout: `<dataset_dir>/runDate=YYYY-MM-DD/part-<n>.parquet`. The partition
//! value lives in the directory name only. Parts are never rewritten; each
//! compaction adds the next free part index to its partition.

use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, Float64Array, Float64Builder, Int64Array, Int64Builder, StringArray,
    StringBuilder, TimestampMillisecondArray, TimestampMillisecondBuilder, UInt32Array,
    UInt32Builder,
};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, NaiveDate};
use log::{debug, info};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use crate::config::PARTITION_COLUMN;
use crate::error_handling::StorageError;
use crate::models::{CharacterFightRecord, DatasetRow, ReportCode};
use crate::storage::staging::StagingArea;

const PART_PREFIX: &str = "part-";
const PART_SUFFIX: &str = ".parquet";

/// What one compaction did.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CompactionReport {
    pub staged_files: usize,
    pub rows: usize,
    /// Part file written, if there were rows to write
    pub part: Option<PathBuf>,
}

pub fn schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("report_code", DataType::Utf8, false),
        Field::new("fight_id", DataType::Int64, false),
        Field::new("dungeon_name", DataType::Utf8, false),
        Field::new("keystone_level", DataType::Int64, true),
        Field::new(
            "start_time",
            DataType::Timestamp(TimeUnit::Millisecond, Some("UTC".into())),
            false,
        ),
        Field::new("name", DataType::Utf8, false),
        Field::new("game_id", DataType::Int64, true),
        Field::new("actor_id", DataType::Int64, true),
        Field::new("class", DataType::Utf8, true),
        Field::new("item_level", DataType::Float64, true),
        Field::new("damage_done", DataType::Float64, true),
        Field::new("healing_done", DataType::Float64, true),
        Field::new("deaths", DataType::UInt32, true),
    ]))
}

/// Column-wise conversion of records into one batch.
pub fn to_record_batch<'a>(
    records: impl IntoIterator<Item = &'a CharacterFightRecord>,
) -> Result<RecordBatch, StorageError> {
    let mut report_code = StringBuilder::new();
    let mut fight_id = Int64Builder::new();
    let mut dungeon_name = StringBuilder::new();
    let mut keystone_level = Int64Builder::new();
    let mut start_time = TimestampMillisecondBuilder::new().with_timezone("UTC");
    let mut name = StringBuilder::new();
    let mut game_id = Int64Builder::new();
    let mut actor_id = Int64Builder::new();
    let mut class = StringBuilder::new();
    let mut item_level = Float64Builder::new();
    let mut damage_done = Float64Builder::new();
    let mut healing_done = Float64Builder::new();
    let mut deaths = UInt32Builder::new();

    for record in records {
        report_code.append_value(record.report_code.as_str());
        fight_id.append_value(record.fight_id);
        dungeon_name.append_value(&record.dungeon_name);
        keystone_level.append_option(record.keystone_level);
        start_time.append_value(record.start_time.timestamp_millis());
        name.append_value(&record.name);
        game_id.append_option(record.game_id);
        actor_id.append_option(record.actor_id);
        class.append_option(record.class.as_deref());
        item_level.append_option(record.item_level);
        damage_done.append_option(record.damage_done);
        healing_done.append_option(record.healing_done);
        deaths.append_option(record.deaths);
    }

    let columns: Vec<ArrayRef> = vec![
        Arc::new(report_code.finish()),
        Arc::new(fight_id.finish()),
        Arc::new(dungeon_name.finish()),
        Arc::new(keystone_level.finish()),
        Arc::new(start_time.finish()),
        Arc::new(name.finish()),
        Arc::new(game_id.finish()),
        Arc::new(actor_id.finish()),
        Arc::new(class.finish()),
        Arc::new(item_level.finish()),
        Arc::new(damage_done.finish()),
        Arc::new(healing_done.finish()),
        Arc::new(deaths.finish()),
    ];
    Ok(RecordBatch::try_new(schema(), columns)?)
}

pub fn partition_dir(dataset_dir: &Path, run_date: NaiveDate) -> PathBuf {
    dataset_dir.join(format!(
        "{}={}",
        PARTITION_COLUMN,
        run_date.format("%Y-%m-%d")
    ))
}

fn part_index(file_name: &str) -> Option<u64> {
    file_name
        .strip_prefix(PART_PREFIX)?
        .strip_suffix(PART_SUFFIX)?
        .parse()
        .ok()
}

/// Part files of one partition, ordered by index.
fn list_parts(partition: &Path) -> Result<Vec<(u64, PathBuf)>, StorageError> {
    let entries = match std::fs::read_dir(partition) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(StorageError::io(partition, e)),
    };
    let mut parts = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| StorageError::io(partition, e))?;
        if let Some(index) = entry.file_name().to_str().and_then(part_index) {
            parts.push((index, entry.path()));
        }
    }
    parts.sort();
    Ok(parts)
}

/// First part path of `partition` that does not collide with an existing part.
pub fn next_part_path(partition: &Path) -> Result<PathBuf, StorageError> {
    let next = list_parts(partition)?
        .last()
        .map_or(0, |(index, _)| index + 1);
    Ok(partition.join(format!("{}{}{}", PART_PREFIX, next, PART_SUFFIX)))
}

fn write_part(partition: &Path, batch: &RecordBatch) -> Result<PathBuf, StorageError> {
    std::fs::create_dir_all(partition).map_err(|e| StorageError::io(partition, e))?;
    let path = next_part_path(partition)?;
    let file = File::create(&path).map_err(|e| StorageError::io(&path, e))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();

    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(batch)?;
    writer.close()?;
    Ok(path)
}

/// Folds every staged report into a new part of the `run_date` partition, then
/// clears staging.
///
/// Nothing staged is a no-op. On failure the staged files are left in place.
pub async fn compact(
    staging: &StagingArea,
    dataset_dir: &Path,
    run_date: NaiveDate,
) -> Result<CompactionReport, StorageError> {
    let files = staging.load_all().await?;
    if files.is_empty() {
        info!("Nothing staged in {}, skipping compaction", staging.dir().display());
        return Ok(CompactionReport::default());
    }

    let batch = to_record_batch(files.iter().flat_map(|file| file.report.data.iter()))?;
    let rows = batch.num_rows();
    let part = if rows == 0 {
        debug!("{} staged report(s) hold no rows", files.len());
        None
    } else {
        let partition = partition_dir(dataset_dir, run_date);
        let written = tokio::task::spawn_blocking(move || write_part(&partition, &batch))
            .await
            .map_err(|e| StorageError::io(dataset_dir, std::io::Error::other(e)))??;
        info!("Appended {} row(s) to {}", rows, written.display());
        Some(written)
    };

    staging.clear(&files).await?;
    Ok(CompactionReport {
        staged_files: files.len(),
        rows,
        part,
    })
}

fn layout_error(path: &Path, reason: impl Into<String>) -> StorageError {
    StorageError::Layout {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

fn column<'b, A: Array + 'static>(
    batch: &'b RecordBatch,
    name: &str,
    path: &Path,
) -> Result<&'b A, StorageError> {
    batch
        .column_by_name(name)
        .and_then(|column| column.as_any().downcast_ref::<A>())
        .ok_or_else(|| layout_error(path, format!("missing or mistyped column {name}")))
}

fn optional<T>(array: &dyn Array, row: usize, value: impl FnOnce() -> T) -> Option<T> {
    (!array.is_null(row)).then(value)
}

fn decode_batch(
    batch: &RecordBatch,
    run_date: NaiveDate,
    path: &Path,
) -> Result<Vec<DatasetRow>, StorageError> {
    let report_code = column::<StringArray>(batch, "report_code", path)?;
    let fight_id = column::<Int64Array>(batch, "fight_id", path)?;
    let dungeon_name = column::<StringArray>(batch, "dungeon_name", path)?;
    let keystone_level = column::<Int64Array>(batch, "keystone_level", path)?;
    let start_time = column::<TimestampMillisecondArray>(batch, "start_time", path)?;
    let name = column::<StringArray>(batch, "name", path)?;
    let game_id = column::<Int64Array>(batch, "game_id", path)?;
    let actor_id = column::<Int64Array>(batch, "actor_id", path)?;
    let class = column::<StringArray>(batch, "class", path)?;
    let item_level = column::<Float64Array>(batch, "item_level", path)?;
    let damage_done = column::<Float64Array>(batch, "damage_done", path)?;
    let healing_done = column::<Float64Array>(batch, "healing_done", path)?;
    let deaths = column::<UInt32Array>(batch, "deaths", path)?;

    (0..batch.num_rows())
        .map(|row| {
            let start = DateTime::from_timestamp_millis(start_time.value(row))
                .ok_or_else(|| layout_error(path, "start_time out of range"))?;
            Ok(DatasetRow {
                run_date,
                record: CharacterFightRecord {
                    report_code: ReportCode::new(report_code.value(row)),
                    fight_id: fight_id.value(row),
                    dungeon_name: dungeon_name.value(row).to_string(),
                    keystone_level: optional(keystone_level, row, || keystone_level.value(row)),
                    start_time: start,
                    name: name.value(row).to_string(),
                    game_id: optional(game_id, row, || game_id.value(row)),
                    actor_id: optional(actor_id, row, || actor_id.value(row)),
                    class: optional(class, row, || class.value(row).to_string()),
                    item_level: optional(item_level, row, || item_level.value(row)),
                    damage_done: optional(damage_done, row, || damage_done.value(row)),
                    healing_done: optional(healing_done, row, || healing_done.value(row)),
                    deaths: optional(deaths, row, || deaths.value(row)),
                },
            })
        })
        .collect()
}

fn read_part(path: &Path, run_date: NaiveDate) -> Result<Vec<DatasetRow>, StorageError> {
    let file = File::open(path).map_err(|e| StorageError::io(path, e))?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
    let mut rows = Vec::new();
    for batch in reader {
        rows.extend(decode_batch(&batch?, run_date, path)?);
    }
    Ok(rows)
}

/// Reads the whole dataset back, partitions by date and parts by index.
/// A missing dataset directory is empty.
pub fn read_dataset(dataset_dir: &Path) -> Result<Vec<DatasetRow>, StorageError> {
    let entries = match std::fs::read_dir(dataset_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(StorageError::io(dataset_dir, e)),
    };

    let prefix = format!("{}=", PARTITION_COLUMN);
    let mut partitions = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| StorageError::io(dataset_dir, e))?;
        let file_name = entry.file_name();
        let Some(date) = file_name.to_str().and_then(|n| n.strip_prefix(&prefix)) else {
            continue;
        };
        let run_date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|e| layout_error(&entry.path(), e.to_string()))?;
        partitions.push((run_date, entry.path()));
    }
    partitions.sort();

    let mut rows = Vec::new();
    for (run_date, partition) in partitions {
        for (_, part) in list_parts(&partition)? {
            rows.extend(read_part(&part, run_date)?);
        }
    }
    debug!("Read {} row(s) from {}", rows.len(), dataset_dir.display());
    Ok(rows)
}
