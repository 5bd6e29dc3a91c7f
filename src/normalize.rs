//! Maps raw upstream records onto a data source's fixed output schema.

use crate::types::data_source::{FieldKind, FieldSpec, CROP_CODE_FIELDS};
use crate::types::record::{first_present, NormalizedRecord, RawRecord};
use crate::types::roc_date::roc_to_western;

/// Normalizes one raw record against `schema`.
///
/// For every field the synonyms are probed in order and the first present,
/// non-empty value is taken; a field with no match becomes an empty string.
/// ROC date fields are rewritten in the Gregorian calendar, and crop name
/// fields take the canonical name of the record's crop code. This function is
/// total: it never fails and always yields every schema field.
///
/// # Examples
///
/// ```
/// use agrifetch::{normalize_record, Dataset};
/// use serde_json::json;
///
/// let source = Dataset::ProducePrices.source();
/// let raw = json!({"交易日期": "113.01.05", "作物代號": "A1", "平均價": 31.5});
/// let record = normalize_record(raw.as_object().unwrap(), source.schema);
///
/// assert_eq!(record.get("TransDate"), Some("2024.01.05"));
/// assert_eq!(record.get("CropCode"), Some("A1"));
/// // `MiddlePrice` falls back to the average price when absent.
/// assert_eq!(record.get("MiddlePrice"), Some("31.5"));
/// assert_eq!(record.get("Unit"), Some(""));
/// ```
pub fn normalize_record(raw: &RawRecord, schema: &'static [FieldSpec]) -> NormalizedRecord {
    let mut record = NormalizedRecord::with_capacity(schema.len());
    for field in schema {
        let value = first_present(raw, field.synonyms).unwrap_or_default();
        let value = match field.kind {
            FieldKind::Text => value,
            FieldKind::RocDate => roc_to_western(&value),
            FieldKind::CropName { names } => canonical_crop_name(raw, names).unwrap_or(value),
        };
        record.push(field.name, value);
    }
    record
}

fn canonical_crop_name(raw: &RawRecord, names: &[(&str, &'static str)]) -> Option<String> {
    let code = first_present(raw, CROP_CODE_FIELDS)?;
    names
        .iter()
        .find(|(known, _)| *known == code.trim())
        .map(|(_, name)| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::data_source::Dataset;
    use serde_json::json;

    #[test]
    fn test_empty_record_yields_every_field() {
        for dataset in Dataset::ALL {
            let source = dataset.source();
            let record = normalize_record(&RawRecord::new(), source.schema);
            assert_eq!(record.field_names().collect::<Vec<_>>(), source.header());
            assert!(record.values().all(str::is_empty));
        }
    }

    #[test]
    fn test_english_names_win_over_chinese() {
        let source = Dataset::FruitPrices.source();
        let raw = json!({
            "TransDate": "112.12.31",
            "交易日期": "111.01.01",
            "CropName": "香蕉",
            "市場名稱": "台北一",
            "上價": 40,
            "TransVolume": 1234.5,
        });
        let record = normalize_record(raw.as_object().unwrap(), source.schema);
        assert_eq!(record.get("交易日期"), Some("2023.12.31"));
        assert_eq!(record.get("作物名稱"), Some("香蕉"));
        assert_eq!(record.get("市場名稱"), Some("台北一"));
        assert_eq!(record.get("上價"), Some("40"));
        assert_eq!(record.get("交易量"), Some("1234.5"));
        assert_eq!(record.get("中價"), Some(""));
    }

    #[test]
    fn test_selected_fruit_names_follow_crop_code() {
        let source = Dataset::SelectedFruits.source();
        let starfruit = json!({"CropCode": "M3", "CropName": "楊桃-其他"});
        let record = normalize_record(starfruit.as_object().unwrap(), source.schema);
        assert_eq!(record.get("CropName"), Some("楊桃"));

        let wax_apple = json!({"作物代號": " Q1 ", "作物名稱": "蓮霧-紅色"});
        let record = normalize_record(wax_apple.as_object().unwrap(), source.schema);
        assert_eq!(record.get("CropName"), Some("蓮霧"));

        // Unknown codes keep the upstream name.
        let other = json!({"CropCode": "ZZ", "CropName": "其他"});
        let record = normalize_record(other.as_object().unwrap(), source.schema);
        assert_eq!(record.get("CropName"), Some("其他"));

        // Other datasets keep the upstream variety name.
        let record = normalize_record(starfruit.as_object().unwrap(), Dataset::ProducePrices.source().schema);
        assert_eq!(record.get("CropName"), Some("楊桃-其他"));
    }

    #[test]
    fn test_malformed_date_is_kept() {
        let source = Dataset::ProducePrices.source();
        let raw = json!({"TransDate": "113/01/05", "CropCode": "A1"});
        let record = normalize_record(raw.as_object().unwrap(), source.schema);
        assert_eq!(record.get("TransDate"), Some("113/01/05"));
        assert_eq!(record.get("CropCode"), Some("A1"));
    }

    #[test]
    fn test_normalizing_output_again_is_stable() {
        let raw = json!({
            "交易日期": "113.02.29",
            "種類代碼": "N05",
            "作物代號": "A1",
            "作物名稱": "香蕉",
            "平均價": 28.7,
            "交易量": 512,
            "更新時間": null,
        });
        for dataset in Dataset::ALL {
            let source = dataset.source();
            let once = normalize_record(raw.as_object().unwrap(), source.schema);
            let twice = normalize_record(&once.to_raw(), source.schema);
            assert_eq!(once, twice, "{dataset} is not stable");
        }
    }
}
