use super::model::{DimensionEntry, FlatRow, ProductRecord, SizeVariant};

/// Flatten one product into rows, cross-joining size variants (outer) with
/// dimension entries (inner).
///
/// An empty axis contributes a single "null" slot, so a record with S variants
/// and D dimensions yields `max(S,1) * max(D,1)` rows.
pub fn flatten(record: &ProductRecord) -> Vec<FlatRow> {
    let variants: Vec<Option<&SizeVariant>> = axis(record.size_variants());
    let dimensions: Vec<Option<&DimensionEntry>> = axis(record.dimension_entries());

    let image_url = record.hero_image_url().map(str::to_string);
    let mut rows = Vec::with_capacity(variants.len() * dimensions.len());

    for variant in &variants {
        let bedsize = variant.and_then(SizeVariant::label).map(str::to_string);
        let artnum = variant.and_then(|v| v.artnum.clone());
        for dimension in &dimensions {
            rows.push(FlatRow {
                name: record.name().to_string(),
                slug: record.slug().to_string(),
                image_url: image_url.clone(),
                bedsize: bedsize.clone(),
                artnum: artnum.clone(),
                dimensions: dimension.and_then(|d| d.value.clone()),
            });
        }
    }

    rows
}

/// Flatten many records, keeping record order.
pub fn flatten_all(records: &[ProductRecord]) -> Vec<FlatRow> {
    records.iter().flat_map(flatten).collect()
}

fn axis<T>(items: &[T]) -> Vec<Option<&T>> {
    if items.is_empty() {
        vec![None]
    } else {
        items.iter().map(Some).collect()
    }
}
