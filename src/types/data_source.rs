//! Describes an upstream dataset: where to page it from, which records to keep,
//! and how to map its bilingual field names onto a fixed output schema.

use crate::types::record::{first_present, RawRecord};
use std::fmt;
use std::str::FromStr;

/// Wholesale transaction endpoint of the Council of Agriculture open-data service.
pub const FARM_TRANS_URL: &str = "https://data.moa.gov.tw/Service/OpenData/FromM/FarmTransData.aspx";

/// Upstream category code for fruit.
pub const FRUIT_CATEGORY: &str = "N05";

const CATEGORY_FIELDS: &[&str] = &["CategoryCode", "種類代碼"];
pub(crate) const CROP_CODE_FIELDS: &[&str] = &["CropCode", "作物代號"];

/// Crop code and canonical name of each fruit tracked by [`Dataset::SelectedFruits`].
///
/// Several codes share a name (`D1`/`M3`, `22`/`Q1`), which folds upstream
/// variety names such as `楊桃-其他` into one crop.
pub const SELECTED_FRUITS: &[(&str, &str)] = &[
    ("72", "番茄"), ("I1", "木瓜"), ("51", "百香果"), ("T1", "西瓜"), ("N3", "李"),
    ("R1", "芒果"), ("L1", "枇杷"), ("H1", "文旦柚"), ("H2", "白柚"), ("Z4", "柿"),
    ("W1", "洋香瓜"), ("A1", "香蕉"), ("Y1", "桃"), ("45", "草莓"), ("J1", "荔枝"),
    ("D1", "楊桃"), ("41", "梅"), ("O10", "梨"), ("V1", "香瓜"), ("E1", "柳橙"),
    ("22", "蓮霧"), ("C1", "椪柑"), ("P1", "番石榴"), ("11", "可可椰子"), ("M3", "楊桃"),
    ("C5", "溫州蜜柑"), ("S1", "葡萄"), ("H4", "葡萄柚"), ("B2", "鳳梨"), ("Q1", "蓮霧"),
    ("G7", "龍眼"), ("K3", "棗"), ("F1", "蘋果"), ("X69", "釋迦"), ("31", "番茄枝"),
];

/// How the normalizer treats a field's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Copied through unchanged.
    Text,
    /// An ROC calendar date, rewritten as a Gregorian `YYYY.MM.DD` date.
    RocDate,
    /// Named after the record's crop code through `names`. Codes missing from
    /// the table keep the upstream value.
    CropName {
        names: &'static [(&'static str, &'static str)],
    },
}

/// One column of an output schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldSpec {
    /// Output column name.
    pub name: &'static str,
    /// Upstream field names to probe, in order. The first present, non-empty value wins.
    pub synonyms: &'static [&'static str],
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn text(name: &'static str, synonyms: &'static [&'static str]) -> Self {
        Self {
            name,
            synonyms,
            kind: FieldKind::Text,
        }
    }

    pub const fn roc_date(name: &'static str, synonyms: &'static [&'static str]) -> Self {
        Self {
            name,
            synonyms,
            kind: FieldKind::RocDate,
        }
    }

    pub const fn crop_name(
        name: &'static str,
        synonyms: &'static [&'static str],
        names: &'static [(&'static str, &'static str)],
    ) -> Self {
        Self {
            name,
            synonyms,
            kind: FieldKind::CropName { names },
        }
    }
}

/// A predicate a raw record must satisfy to be kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordFilter {
    /// The category discriminator (`CategoryCode` / `種類代碼`) equals `code`.
    Category { code: String },
    /// The crop code (`CropCode` / `作物代號`) is one of `codes`.
    CropCodes { codes: Vec<String> },
}

impl RecordFilter {
    pub fn category(code: impl Into<String>) -> Self {
        Self::Category { code: code.into() }
    }

    pub fn crop_codes<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::CropCodes {
            codes: codes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn matches(&self, record: &RawRecord) -> bool {
        match self {
            RecordFilter::Category { code } => {
                probe_key(record, CATEGORY_FIELDS).is_some_and(|found| found.trim() == code.as_str())
            }
            RecordFilter::CropCodes { codes } => probe_key(record, CROP_CODE_FIELDS)
                .is_some_and(|found| codes.iter().any(|c| c == found.trim())),
        }
    }
}

/// Value of the first of `names` present as a key, even if empty.
fn probe_key(record: &RawRecord, names: &[&str]) -> Option<String> {
    let key = names.iter().find(|name| record.contains_key(**name))?;
    Some(first_present(record, &[*key]).unwrap_or_default())
}

/// Columns of an output schema the daily summary groups and aggregates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryColumns {
    pub date: &'static str,
    pub crop_code: &'static str,
    pub crop_name: &'static str,
    pub average_price: &'static str,
    pub volume: &'static str,
}

/// Everything the pipeline needs to know about one upstream dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSource {
    pub name: String,
    pub endpoint: String,
    /// Query parameters sent with every page request in addition to the date
    /// range and paging parameters.
    pub extra_params: Vec<(String, String)>,
    /// All filters must match for a record to be kept. Empty keeps everything.
    pub filters: Vec<RecordFilter>,
    pub schema: &'static [FieldSpec],
    pub summary: SummaryColumns,
}

impl DataSource {
    pub fn keeps(&self, record: &RawRecord) -> bool {
        self.filters.iter().all(|filter| filter.matches(record))
    }

    /// Output column names in order; the CSV header.
    pub fn header(&self) -> Vec<&'static str> {
        self.schema.iter().map(|field| field.name).collect()
    }
}

/// The built-in datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    /// Fruit (`N05`) transactions with Chinese column names.
    FruitPrices,
    /// Fruit (`N05`) transactions with the full English column set.
    ProducePrices,
    /// Transactions for a fixed list of tracked fruit crops.
    SelectedFruits,
}

const FRUIT_PRICES_SCHEMA: &[FieldSpec] = &[
    FieldSpec::roc_date("交易日期", &["TransDate", "交易日期"]),
    FieldSpec::text("種類代碼", &["CategoryCode", "種類代碼"]),
    FieldSpec::text("作物代號", &["CropCode", "作物代號"]),
    FieldSpec::text("作物名稱", &["CropName", "作物名稱"]),
    FieldSpec::text("市場代號", &["MarketCode", "市場代號"]),
    FieldSpec::text("市場名稱", &["MarketName", "市場名稱"]),
    FieldSpec::text("上價", &["UpperPrice", "上價"]),
    FieldSpec::text("中價", &["MiddlePrice", "中價"]),
    FieldSpec::text("下價", &["LowerPrice", "下價"]),
    FieldSpec::text("平均價", &["AveragePrice", "平均價"]),
    FieldSpec::text("交易量", &["TransVolume", "交易量"]),
];

const PRODUCE_PRICES_SCHEMA: &[FieldSpec] = &[
    FieldSpec::roc_date("TransDate", &["TransDate", "交易日期"]),
    FieldSpec::text("MarketCode", &["MarketCode", "市場代號"]),
    FieldSpec::text("MarketName", &["MarketName", "市場名稱"]),
    FieldSpec::text("CropCode", &["CropCode", "作物代號"]),
    FieldSpec::text("CropName", &["CropName", "作物名稱"]),
    FieldSpec::text("CategoryCode", &["CategoryCode", "種類代碼", "TypeCode"]),
    FieldSpec::text("UpperPrice", &["UpperPrice", "上價"]),
    FieldSpec::text("MiddlePrice", &["MiddlePrice", "中價", "平均價"]),
    FieldSpec::text("LowerPrice", &["LowerPrice", "下價"]),
    FieldSpec::text("AveragePrice", &["AveragePrice", "平均價", "中價"]),
    FieldSpec::text("TransVolume", &["TransVolume", "交易量"]),
    FieldSpec::text("TransAmount", &["TransAmount", "交易金額"]),
    FieldSpec::text("Unit", &["Unit", "單位"]),
    FieldSpec::text("County", &["County", "縣市"]),
    FieldSpec::text("Township", &["Township", "鄉鎮"]),
    FieldSpec::text("UpdateTime", &["UpdateTime", "更新時間"]),
];

const SELECTED_FRUITS_SCHEMA: &[FieldSpec] = &[
    FieldSpec::roc_date("TransDate", &["TransDate", "交易日期"]),
    FieldSpec::text("MarketCode", &["MarketCode", "市場代號"]),
    FieldSpec::text("MarketName", &["MarketName", "市場名稱"]),
    FieldSpec::text("CropCode", &["CropCode", "作物代號"]),
    FieldSpec::crop_name("CropName", &["CropName", "作物名稱"], SELECTED_FRUITS),
    FieldSpec::text("UpperPrice", &["UpperPrice", "上價"]),
    FieldSpec::text("MiddlePrice", &["MiddlePrice", "中價"]),
    FieldSpec::text("LowerPrice", &["LowerPrice", "下價"]),
    FieldSpec::text("AveragePrice", &["AveragePrice", "平均價"]),
    FieldSpec::text("TransVolume", &["TransVolume", "交易量"]),
    FieldSpec::text("TypeCode", &["TypeCode", "CategoryCode", "種類代碼"]),
];

const ENGLISH_SUMMARY: SummaryColumns = SummaryColumns {
    date: "TransDate",
    crop_code: "CropCode",
    crop_name: "CropName",
    average_price: "AveragePrice",
    volume: "TransVolume",
};

impl Dataset {
    pub const ALL: [Dataset; 3] = [
        Dataset::FruitPrices,
        Dataset::ProducePrices,
        Dataset::SelectedFruits,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Dataset::FruitPrices => "fruit",
            Dataset::ProducePrices => "produce",
            Dataset::SelectedFruits => "selected-fruits",
        }
    }

    pub fn source(&self) -> DataSource {
        let fruit_query = vec![("TcType".to_string(), FRUIT_CATEGORY.to_string())];
        let (extra_params, filters, schema, summary) = match self {
            Dataset::FruitPrices => (
                fruit_query,
                vec![RecordFilter::category(FRUIT_CATEGORY)],
                FRUIT_PRICES_SCHEMA,
                SummaryColumns {
                    date: "交易日期",
                    crop_code: "作物代號",
                    crop_name: "作物名稱",
                    average_price: "平均價",
                    volume: "交易量",
                },
            ),
            Dataset::ProducePrices => (
                Vec::new(),
                vec![RecordFilter::category(FRUIT_CATEGORY)],
                PRODUCE_PRICES_SCHEMA,
                ENGLISH_SUMMARY,
            ),
            Dataset::SelectedFruits => (
                fruit_query,
                vec![
                    RecordFilter::category(FRUIT_CATEGORY),
                    RecordFilter::crop_codes(SELECTED_FRUITS.iter().map(|(code, _)| *code)),
                ],
                SELECTED_FRUITS_SCHEMA,
                ENGLISH_SUMMARY,
            ),
        };
        DataSource {
            name: self.key().to_string(),
            endpoint: FARM_TRANS_URL.to_string(),
            extra_params,
            filters,
            schema,
            summary,
        }
    }
}

impl From<Dataset> for DataSource {
    fn from(dataset: Dataset) -> Self {
        dataset.source()
    }
}

/// Allows formatting a `Dataset` using its CLI key.
///
/// # Examples
///
/// ```
/// use agrifetch::Dataset;
///
/// assert_eq!(Dataset::SelectedFruits.to_string(), "selected-fruits");
/// assert_eq!("fruit".parse::<Dataset>(), Ok(Dataset::FruitPrices));
/// ```
impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for Dataset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dataset::ALL
            .into_iter()
            .find(|dataset| dataset.key() == s)
            .ok_or_else(|| {
                let known: Vec<_> = Dataset::ALL.iter().map(Dataset::key).collect();
                format!("unknown dataset '{s}', expected one of: {}", known.join(", "))
            })
    }
}
