//! Sort canonicalization and the "strictly after cursor" filter.

use folio_core::{Filter, FolioError, FolioResult, SortDirection, SortField, SortSpec};
use serde_json::Value;

/// Canonicalizes a sort for keyset use.
///
/// - an empty sort is rejected;
/// - a field repeated with the same direction is kept once, with
///   conflicting directions it is rejected;
/// - the result always ends with `id_field`. When the caller did not sort
///   on it, it is appended in the dominant direction (the majority
///   direction, ties going to the primary field). When the caller did, any
///   fields after it are dropped since they can never break a tie.
pub fn validate_keyset_sort(sort: &SortSpec, id_field: &str) -> FolioResult<SortSpec> {
    if sort.is_empty() {
        return Err(FolioError::MissingSort);
    }

    let mut fields: Vec<SortField> = Vec::with_capacity(sort.len() + 1);
    for field in sort.fields() {
        if field.field.is_empty() {
            return Err(FolioError::invalid_sort("empty field name"));
        }
        match fields.iter().find(|f| f.field == field.field) {
            Some(existing) if existing.direction != field.direction => {
                return Err(FolioError::invalid_sort(format!(
                    "field '{}' appears with conflicting directions",
                    field.field
                )));
            }
            Some(_) => {}
            None => fields.push(field.clone()),
        }
    }

    if let Some(pos) = fields.iter().position(|f| f.field == id_field) {
        fields.truncate(pos + 1);
    } else {
        fields.push(SortField::new(id_field, dominant_direction(&fields)));
    }

    Ok(SortSpec::from_fields(fields))
}

fn dominant_direction(fields: &[SortField]) -> SortDirection {
    let desc = fields.iter().filter(|f| f.direction == SortDirection::Desc).count();
    let asc = fields.len() - desc;
    match desc.cmp(&asc) {
        std::cmp::Ordering::Greater => SortDirection::Desc,
        std::cmp::Ordering::Less => SortDirection::Asc,
        std::cmp::Ordering::Equal => fields
            .first()
            .map_or(SortDirection::Asc, |f| f.direction),
    }
}

/// Builds `base AND (rows strictly after the cursor)` for a normalized sort.
///
/// For `[(f1,d1), …, (fk,dk), (id,dn)]` and cursor values `[v1, …, vk]`,
/// `vid` the expansion is
///
/// ```text
/// (f1 ≻ v1)
/// OR (f1 = v1 AND f2 ≻ v2)
/// OR …
/// OR (f1 = v1 AND … AND fk = vk AND id ≻ vid)
/// ```
///
/// where `≻` is `>` for ascending fields and `<` for descending ones.
pub fn build_keyset_filter(
    base: &Filter,
    sort: &SortSpec,
    cursor_values: &[Value],
    cursor_id: &Value,
    id_field: &str,
) -> FolioResult<Filter> {
    let fields = sort.fields();
    match fields.last() {
        Some(last) if last.field == id_field => {}
        _ => {
            return Err(FolioError::invalid_sort(format!(
                "keyset sort must end with '{}'",
                id_field
            )))
        }
    }
    if cursor_values.len() + 1 != fields.len() {
        return Err(FolioError::CursorSortMismatch);
    }

    let values: Vec<&Value> = cursor_values.iter().chain(std::iter::once(cursor_id)).collect();

    let mut branches = Vec::with_capacity(fields.len());
    for (i, field) in fields.iter().enumerate() {
        let mut conjunction: Vec<Filter> = fields[..i]
            .iter()
            .zip(&values[..i])
            .map(|(prev, value)| Filter::eq(prev.field.clone(), (*value).clone()))
            .collect();
        conjunction.push(strictly_after(field, values[i]));
        branches.push(Filter::and(conjunction));
    }

    Ok(base.clone().and_also(Filter::or(branches)))
}

fn strictly_after(field: &SortField, value: &Value) -> Filter {
    match field.direction {
        SortDirection::Asc => Filter::gt(field.field.clone(), value.clone()),
        SortDirection::Desc => Filter::lt(field.field.clone(), value.clone()),
    }
}
