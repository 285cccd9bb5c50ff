//! LanceDB-backed chunk collection: the persisted vector-store boundary.
//!
//! A collection is created with a fixed vector dimension and distance metric,
//! filled through `upsert`, and queried through `search`. Opening a missing
//! collection fails with `NotFound`; nothing is created implicitly at query time.

use anyhow::{anyhow, Result};
use arrow_array::{Array, FixedSizeListArray, Float32Array, Int32Array, RecordBatch, RecordBatchIterator, StringArray};
use futures::TryStreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, DistanceType};
use std::sync::Arc;
use tracing::{debug, info};

use ragdb_core::types::{Distance, DocumentChunk, ScoredChunk};
use ragdb_core::Error;

use crate::schema::{build_chunk_schema, vector_dim};
use crate::table::{ensure_table, get_meta, set_meta, table_exists, META_TABLE};

const UPSERT_BATCH: usize = 1000;

pub struct LanceCollection {
	conn: Connection,
	name: String,
	dim: usize,
	distance: Distance,
}

impl LanceCollection {
	/// Create the collection, or empty it when it already exists with the same dimension.
	pub async fn create(conn: &Connection, name: &str, dim: usize, distance: Distance) -> Result<Self> {
		let dim_i32 = i32::try_from(dim).ok().filter(|d| *d > 0)
			.ok_or_else(|| Error::InvalidConfig(format!("invalid vector dimension {dim}")))?;
		if name == META_TABLE {
			return Err(Error::InvalidConfig(format!("collection name '{name}' is reserved")).into());
		}
		if table_exists(conn, name).await? {
			let table = conn.open_table(name).execute().await?;
			let existing = vector_dim(table.schema().await?.as_ref());
			if existing != Some(dim) {
				return Err(Error::InvalidConfig(format!(
					"collection '{name}' exists with dimension {existing:?}; remove it before recreating with {dim}"
				)).into());
			}
			table.delete("true").await?;
			info!(collection = name, "cleared existing collection");
		} else {
			ensure_table(conn, name, build_chunk_schema(dim_i32)).await?;
			info!(collection = name, dim, %distance, "created collection");
		}
		set_meta(conn, META_TABLE, &distance_key(name), distance.as_str()).await?;
		Ok(Self { conn: conn.clone(), name: name.to_string(), dim, distance })
	}

	pub async fn open(conn: &Connection, name: &str) -> Result<Self> {
		if !table_exists(conn, name).await? {
			return Err(Error::NotFound(format!("collection '{name}'")).into());
		}
		let table = conn.open_table(name).execute().await?;
		let dim = vector_dim(table.schema().await?.as_ref())
			.ok_or_else(|| anyhow!("collection '{name}' has no fixed-size vector column"))?;
		let distance = match get_meta(conn, META_TABLE, &distance_key(name)).await? {
			Some(raw) => raw.parse::<Distance>()?,
			None => Distance::default(),
		};
		debug!(collection = name, dim, %distance, "opened collection");
		Ok(Self { conn: conn.clone(), name: name.to_string(), dim, distance })
	}

	pub fn name(&self) -> &str { &self.name }
	pub fn dim(&self) -> usize { self.dim }
	pub fn distance(&self) -> Distance { self.distance }

	pub async fn len(&self) -> Result<usize> {
		let table = self.conn.open_table(&self.name).execute().await?;
		Ok(table.count_rows(None).await?)
	}

	pub async fn is_empty(&self) -> Result<bool> {
		Ok(self.len().await? == 0)
	}

	/// Insert or replace chunks keyed by `id`. Returns the number of rows written.
	pub async fn upsert(&self, chunks: &[DocumentChunk], vectors: &[Vec<f32>]) -> Result<usize> {
		if chunks.len() != vectors.len() {
			return Err(Error::LengthMismatch { chunks: chunks.len(), vectors: vectors.len() }.into());
		}
		if let Some(bad) = vectors.iter().find(|v| v.len() != self.dim) {
			return Err(Error::DimensionMismatch { expected: self.dim, actual: bad.len() }.into());
		}
		if chunks.is_empty() { return Ok(0); }

		let table = self.conn.open_table(&self.name).execute().await?;
		let pb = ProgressBar::new(chunks.len() as u64);
		pb.set_style(ProgressStyle::default_bar()
			.template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}")?
			.progress_chars("#>-"));
		let mut written = 0usize;
		for (batch_chunks, batch_vectors) in chunks.chunks(UPSERT_BATCH).zip(vectors.chunks(UPSERT_BATCH)) {
			let batch = self.to_record_batch(batch_chunks, batch_vectors)?;
			let schema = batch.schema();
			let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
			let mut mi = table.merge_insert(&["id"]);
			mi.when_matched_update_all(None).when_not_matched_insert_all();
			let _ = mi.execute(reader).await?;
			written += batch_chunks.len();
			pb.set_position(written as u64);
		}
		pb.finish_with_message("done");
		info!(collection = %self.name, written, "upserted chunks");
		Ok(written)
	}

	/// Up to `k` chunks ordered by ascending distance under the collection's metric.
	pub async fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
		if query.len() != self.dim {
			return Err(Error::DimensionMismatch { expected: self.dim, actual: query.len() }.into());
		}
		if k == 0 {
			return Ok(vec![]);
		}
		let table = self.conn.open_table(&self.name).execute().await?;
		let mut stream = table
			.vector_search(query.to_vec())?
			.distance_type(distance_type(self.distance))
			.limit(k)
			.execute()
			.await?;
		let mut hits = Vec::new();
		while let Some(batch) = stream.try_next().await? {
			hits.extend(batch_to_hits(&batch)?);
		}
		hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
		hits.truncate(k);
		debug!(collection = %self.name, k, returned = hits.len(), "vector search");
		Ok(hits)
	}

	fn to_record_batch(&self, chunks: &[DocumentChunk], vectors: &[Vec<f32>]) -> Result<RecordBatch> {
		let dim = i32::try_from(self.dim)?;
		let schema = build_chunk_schema(dim);
		let mut chunk_indices = Vec::with_capacity(chunks.len());
		let mut total_chunks = Vec::with_capacity(chunks.len());
		for c in chunks {
			chunk_indices.push(i32::try_from(c.chunk_index)?);
			total_chunks.push(i32::try_from(c.total_chunks)?);
		}
		let vectors = vectors.iter().map(|v| Some(v.iter().map(|&x| Some(x)).collect::<Vec<_>>()));
		let record_batch = RecordBatch::try_new(schema, vec![
			Arc::new(StringArray::from_iter_values(chunks.iter().map(|c| c.id.as_str()))),
			Arc::new(StringArray::from_iter_values(chunks.iter().map(|c| c.doc_id.as_str()))),
			Arc::new(StringArray::from_iter_values(chunks.iter().map(|c| c.doc_path.as_str()))),
			Arc::new(StringArray::from_iter_values(chunks.iter().map(|c| c.content.as_str()))),
			Arc::new(Int32Array::from(chunk_indices)),
			Arc::new(Int32Array::from(total_chunks)),
			Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(vectors, dim)),
		])?;
		Ok(record_batch)
	}
}

fn distance_key(collection: &str) -> String {
	format!("distance:{collection}")
}

fn distance_type(distance: Distance) -> DistanceType {
	match distance {
		Distance::L2 => DistanceType::L2,
		Distance::Cosine => DistanceType::Cosine,
	}
}

fn string_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
	batch.column_by_name(name)
		.and_then(|c| c.as_any().downcast_ref::<StringArray>())
		.ok_or_else(|| anyhow!("column '{name}' missing or not utf8"))
}

fn int_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Int32Array> {
	batch.column_by_name(name)
		.and_then(|c| c.as_any().downcast_ref::<Int32Array>())
		.ok_or_else(|| anyhow!("column '{name}' missing or not int32"))
}

fn batch_to_hits(batch: &RecordBatch) -> Result<Vec<ScoredChunk>> {
	let ids = string_col(batch, "id")?;
	let doc_ids = string_col(batch, "doc_id")?;
	let paths = string_col(batch, "doc_path")?;
	let contents = string_col(batch, "content")?;
	let positions = int_col(batch, "chunk_index")?;
	let totals = int_col(batch, "total_chunks")?;
	let distances = batch.column_by_name("_distance")
		.and_then(|c| c.as_any().downcast_ref::<Float32Array>())
		.ok_or_else(|| anyhow!("search result has no _distance column"))?;
	let mut hits = Vec::with_capacity(batch.num_rows());
	for i in 0..batch.num_rows() {
		if distances.is_null(i) { continue; }
		hits.push(ScoredChunk {
			chunk: DocumentChunk {
				id: ids.value(i).to_string(),
				doc_id: doc_ids.value(i).to_string(),
				doc_path: paths.value(i).to_string(),
				content: contents.value(i).to_string(),
				chunk_index: usize::try_from(positions.value(i))?,
				total_chunks: usize::try_from(totals.value(i))?,
			},
			distance: distances.value(i),
		});
	}
	Ok(hits)
}
