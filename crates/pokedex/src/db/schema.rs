use crate::services::Pokemon;
use anyhow::{Context, Result};
use arrow_array::{cast::AsArray, types::Int64Type, ArrayRef, Int64Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

/// Create the Arrow schema for catalog records.
///
/// `seq` is the insertion sequence; it defines store order and is never
/// rewritten by updates.
pub fn create_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("name", DataType::Utf8, false),
        Field::new("no", DataType::Int64, false),
        Field::new("seq", DataType::Int64, false),
    ]))
}

/// Convert records to an Arrow RecordBatch, numbering them from `first_seq`
pub fn pokemon_to_batch(pokemon: &[Pokemon], first_seq: i64) -> Result<RecordBatch> {
    let schema = create_schema();

    let ids: ArrayRef = Arc::new(StringArray::from(
        pokemon.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(),
    ));

    let names: ArrayRef = Arc::new(StringArray::from(
        pokemon.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
    ));

    let numbers: ArrayRef = Arc::new(Int64Array::from(
        pokemon.iter().map(|p| p.no).collect::<Vec<_>>(),
    ));

    let sequence: ArrayRef = Arc::new(Int64Array::from(
        (0..pokemon.len() as i64)
            .map(|i| first_seq + i)
            .collect::<Vec<_>>(),
    ));

    RecordBatch::try_new(schema, vec![ids, names, numbers, sequence])
        .context("Failed to build pokemon record batch")
}

/// Convert a RecordBatch back into records paired with their sequence
pub fn batch_to_pokemon(batch: &RecordBatch) -> Result<Vec<(i64, Pokemon)>> {
    let ids = batch
        .column_by_name("id")
        .context("Missing id column")?
        .as_string::<i32>();
    let names = batch
        .column_by_name("name")
        .context("Missing name column")?
        .as_string::<i32>();
    let numbers = batch
        .column_by_name("no")
        .context("Missing no column")?
        .as_primitive::<Int64Type>();
    let sequence = batch
        .column_by_name("seq")
        .context("Missing seq column")?
        .as_primitive::<Int64Type>();

    Ok((0..batch.num_rows())
        .map(|i| {
            let pokemon = Pokemon {
                id: ids.value(i).to_string(),
                name: names.value(i).to_string(),
                no: numbers.value(i),
            };
            (sequence.value(i), pokemon)
        })
        .collect())
}
