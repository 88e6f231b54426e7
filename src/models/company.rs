use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// 输入表格中的一行公司信息
///
/// `translated_name` 是整条记录的唯一标识
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicCompanyInfo {
    pub original_chinese_name: String,
    pub translated_name: String,
    pub location_eng: String,
}

/// 持股关系（对外投资 / 直接股东 / 受益所有人）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stake {
    pub name: String,
    /// 原样保留站点返回的值（数字或字符串）
    pub fraction: Option<JsonValue>,
}

/// 客户 / 供应商交易
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub name: String,
    pub product: Option<String>,
    pub amount: Option<JsonValue>,
    pub date: Option<JsonValue>,
}

/// 某个历史股东在各期的持股比例
///
/// 序列化为扁平对象：`{"name": "X", "2020": 0.1, "2021": 0.2}`，期数顺序保持不变
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalShareholder {
    pub name: String,
    #[serde(flatten)]
    pub fractions: Map<String, JsonValue>,
}

/// 从站点抓取到的公司数据
///
/// 所有列表字段默认为空；缺失数据用空列表表示
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyFinancialsAndRelations {
    pub display_name: String,
    pub retrieval_date: String,
    pub flags: Vec<String>,
    pub government_ownership_fraction: String,
    pub historical_shareholders: Vec<HistoricalShareholder>,
    pub investments: Vec<Stake>,
    pub direct_shareholders: Vec<Stake>,
    pub beneficial_owners: Vec<Stake>,
    pub customers: Vec<Transaction>,
    pub suppliers: Vec<Transaction>,
    pub pdf_link: String,
}

impl CompanyFinancialsAndRelations {
    /// 是否一个字段都没有抓到
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// 数据库中的一行，JSON 列保持存储时的原始文本
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyRecord {
    pub original_chinese_name: String,
    pub translated_name: String,
    pub location_eng: String,
    pub display_name: String,
    pub retrieval_date: String,
    pub flags: String,
    pub government_ownership_fraction: String,
    pub historical_shareholders: String,
    pub investments: String,
    pub direct_shareholders: String,
    pub beneficial_owners: String,
    pub customers: String,
    pub suppliers: String,
    pub pdf_link: String,
}

impl CompanyRecord {
    /// 列名，顺序与数据表和导出文件一致
    pub const COLUMNS: [&'static str; 14] = [
        "original_chinese_name",
        "translated_name",
        "location_eng",
        "display_name",
        "retrieval_date",
        "flags",
        "government_ownership_fraction",
        "historical_shareholders",
        "investments",
        "direct_shareholders",
        "beneficial_owners",
        "customers",
        "suppliers",
        "pdf_link",
    ];

    /// 按列顺序返回 (列名, 原始值)
    pub fn columns(&self) -> [(&'static str, &str); 14] {
        let values = [
            self.original_chinese_name.as_str(),
            self.translated_name.as_str(),
            self.location_eng.as_str(),
            self.display_name.as_str(),
            self.retrieval_date.as_str(),
            self.flags.as_str(),
            self.government_ownership_fraction.as_str(),
            self.historical_shareholders.as_str(),
            self.investments.as_str(),
            self.direct_shareholders.as_str(),
            self.beneficial_owners.as_str(),
            self.customers.as_str(),
            self.suppliers.as_str(),
            self.pdf_link.as_str(),
        ];
        let mut out = [("", ""); 14];
        for (i, value) in values.into_iter().enumerate() {
            out[i] = (Self::COLUMNS[i], value);
        }
        out
    }

    /// 把存储的文本解码回结构化结果
    ///
    /// 空串和无法解析的 JSON 都按空列表处理
    pub fn decode_result(&self) -> CompanyFinancialsAndRelations {
        CompanyFinancialsAndRelations {
            display_name: self.display_name.clone(),
            retrieval_date: self.retrieval_date.clone(),
            flags: decode_list(&self.flags),
            government_ownership_fraction: self.government_ownership_fraction.clone(),
            historical_shareholders: decode_list(&self.historical_shareholders),
            investments: decode_list(&self.investments),
            direct_shareholders: decode_list(&self.direct_shareholders),
            beneficial_owners: decode_list(&self.beneficial_owners),
            customers: decode_list(&self.customers),
            suppliers: decode_list(&self.suppliers),
            pdf_link: self.pdf_link.clone(),
        }
    }
}

fn decode_list<T: serde::de::DeserializeOwned>(raw: &str) -> Vec<T> {
    if raw.is_empty() {
        return Vec::new();
    }
    serde_json::from_str(raw).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_historical_shareholder_serializes_flat_in_order() {
        let mut fractions = Map::new();
        fractions.insert("2021".to_string(), json!(0.2));
        fractions.insert("2020".to_string(), json!(0.1));
        let holder = HistoricalShareholder {
            name: "X".to_string(),
            fractions,
        };

        let text = serde_json::to_string(&holder).unwrap();
        assert_eq!(text, r#"{"name":"X","2021":0.2,"2020":0.1}"#);

        let back: HistoricalShareholder = serde_json::from_str(&text).unwrap();
        assert_eq!(back, holder);
    }

    #[test]
    fn test_default_result_is_empty() {
        let result = CompanyFinancialsAndRelations::default();
        assert!(result.is_empty());
        assert!(result.flags.is_empty());
        assert_eq!(result.display_name, "");
    }

    #[test]
    fn test_decode_result_tolerates_garbage() {
        let record = CompanyRecord {
            flags: r#"["A","B"]"#.to_string(),
            investments: "not json".to_string(),
            ..Default::default()
        };
        let result = record.decode_result();
        assert_eq!(result.flags, vec!["A", "B"]);
        assert!(result.investments.is_empty());
    }

    #[test]
    fn test_columns_follow_declared_order() {
        let record = CompanyRecord {
            translated_name: "Acme".to_string(),
            pdf_link: "/pdfs/Acme.pdf".to_string(),
            ..Default::default()
        };
        let columns = record.columns();
        assert_eq!(columns[1], ("translated_name", "Acme"));
        assert_eq!(columns[13], ("pdf_link", "/pdfs/Acme.pdf"));
    }
}
