//! WireScreen 响应解读
//!
//! 详情页加载时会发出一系列 JSON 请求。按 URL 片段识别出七类响应，
//! 每类有自己的结构定义和到结果字段的映射。识别与解读分开：
//! `ResponseSection::matching` 只看 URL，`SectionPayload::parse` 只看内容。

use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};
use tracing::{debug, warn};

use crate::infrastructure::ObservedResponse;
use crate::models::{CompanyFinancialsAndRelations, HistoricalShareholder, Stake, Transaction};

const GOVERNMENT_OWNERSHIP_FLAG: &str = "Government Ownership";
const RETRIEVAL_DATE_LABEL: &str = "Latest Retrieval Date";
const BENEFICIAL_OWNERS_SET: &str = "Beneficial Owners";

/// 响应所属的数据区块
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSection {
    BasicInfo,
    HistoricalShareholders,
    Investments,
    DirectShareholders,
    BeneficialOwners,
    Customers,
    Suppliers,
}

impl ResponseSection {
    pub const ALL: [ResponseSection; 7] = [
        ResponseSection::BasicInfo,
        ResponseSection::HistoricalShareholders,
        ResponseSection::Investments,
        ResponseSection::DirectShareholders,
        ResponseSection::BeneficialOwners,
        ResponseSection::Customers,
        ResponseSection::Suppliers,
    ];

    /// 识别该区块的 URL 片段
    pub fn url_pattern(self) -> &'static str {
        match self {
            ResponseSection::BasicInfo => "organization/basic",
            ResponseSection::HistoricalShareholders => "get_historical_shareholders",
            ResponseSection::Investments => "owns",
            ResponseSection::DirectShareholders => "owners",
            ResponseSection::BeneficialOwners => "get_direct_entities",
            ResponseSection::Customers => "customer",
            ResponseSection::Suppliers => "supplier",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ResponseSection::BasicInfo => "基本信息",
            ResponseSection::HistoricalShareholders => "历史股东",
            ResponseSection::Investments => "对外投资",
            ResponseSection::DirectShareholders => "直接股东",
            ResponseSection::BeneficialOwners => "受益所有人",
            ResponseSection::Customers => "客户",
            ResponseSection::Suppliers => "供应商",
        }
    }

    /// URL 命中的全部区块（各片段独立匹配）
    pub fn matching(url: &str) -> impl Iterator<Item = ResponseSection> + '_ {
        Self::ALL
            .into_iter()
            .filter(move |section| url.contains(section.url_pattern()))
    }
}

/// 基本信息响应带来的更新
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BasicInfoUpdate {
    /// 名称和标签，仅在响应包含 entity 时出现
    pub entity: Option<EntitySummary>,
    /// 仅在响应包含 secondary_details 时出现
    pub retrieval_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntitySummary {
    pub display_name: String,
    pub flags: Vec<String>,
    pub government_ownership_fraction: Option<String>,
}

/// 已解析的区块内容
#[derive(Debug, Clone, PartialEq)]
pub enum SectionPayload {
    BasicInfo(BasicInfoUpdate),
    HistoricalShareholders(Vec<HistoricalShareholder>),
    Investments(Vec<Stake>),
    DirectShareholders(Vec<Stake>),
    /// 没有 "Beneficial Owners" 实体集时为 `None`，不覆盖已有值
    BeneficialOwners(Option<Vec<Stake>>),
    Customers(Vec<Transaction>),
    Suppliers(Vec<Transaction>),
}

impl SectionPayload {
    /// 按区块结构解析响应体
    pub fn parse(section: ResponseSection, body: &JsonValue) -> Result<Self, serde_json::Error> {
        Ok(match section {
            ResponseSection::BasicInfo => {
                let envelope = Envelope::<BasicData>::deserialize(body)?;
                SectionPayload::BasicInfo(envelope.data.unwrap_or_default().into_update())
            }
            ResponseSection::HistoricalShareholders => {
                let envelope = Required::<HistoricalData>::deserialize(body)?;
                SectionPayload::HistoricalShareholders(envelope.data.into_shareholders())
            }
            ResponseSection::Investments => {
                let envelope = Envelope::<OwnedData>::deserialize(body)?;
                let owned = envelope.data.and_then(|d| d.owned).unwrap_or_default();
                SectionPayload::Investments(owned.into_iter().map(StakeItem::into_stake).collect())
            }
            ResponseSection::DirectShareholders => {
                let envelope = Envelope::<OwnersData>::deserialize(body)?;
                let owners = envelope.data.and_then(|d| d.owners).unwrap_or_default();
                SectionPayload::DirectShareholders(owners.into_iter().map(StakeItem::into_stake).collect())
            }
            ResponseSection::BeneficialOwners => {
                let envelope = Envelope::<EntitySetsData>::deserialize(body)?;
                SectionPayload::BeneficialOwners(beneficial_owners(envelope.data)?)
            }
            ResponseSection::Customers => {
                let items = transactions(body)?;
                SectionPayload::Customers(
                    items
                        .into_iter()
                        .map(TransactionItem::into_transaction)
                        .collect::<Result<_, _>>()?,
                )
            }
            ResponseSection::Suppliers => {
                let items = transactions(body)?;
                SectionPayload::Suppliers(
                    items
                        .into_iter()
                        .map(TransactionItem::into_transaction)
                        .collect::<Result<_, _>>()?,
                )
            }
        })
    }

    /// 合并到结果中；各区块只写自己的字段
    pub fn apply(self, record: &mut CompanyFinancialsAndRelations) {
        match self {
            SectionPayload::BasicInfo(update) => {
                if let Some(entity) = update.entity {
                    record.display_name = entity.display_name;
                    record.flags = entity.flags;
                    if let Some(fraction) = entity.government_ownership_fraction {
                        record.government_ownership_fraction = fraction;
                    }
                }
                if let Some(date) = update.retrieval_date {
                    record.retrieval_date = date;
                }
            }
            SectionPayload::HistoricalShareholders(holders) => record.historical_shareholders = holders,
            SectionPayload::Investments(stakes) => record.investments = stakes,
            SectionPayload::DirectShareholders(stakes) => record.direct_shareholders = stakes,
            SectionPayload::BeneficialOwners(Some(stakes)) => record.beneficial_owners = stakes,
            SectionPayload::BeneficialOwners(None) => {}
            SectionPayload::Customers(items) => record.customers = items,
            SectionPayload::Suppliers(items) => record.suppliers = items,
        }
    }
}

/// 处理一个拦截到的响应，返回成功合并的区块数
///
/// 非 JSON 响应直接忽略；内容解析失败只跳过对应区块
pub fn interpret_response(
    response: &ObservedResponse,
    record: &mut CompanyFinancialsAndRelations,
) -> usize {
    if !response.is_json() {
        return 0;
    }

    let sections: Vec<ResponseSection> = ResponseSection::matching(&response.url).collect();
    if sections.is_empty() {
        return 0;
    }

    let body: JsonValue = match serde_json::from_str(&response.body) {
        Ok(body) => body,
        Err(e) => {
            warn!("响应不是合法 JSON ({}): {}", response.url, e);
            return 0;
        }
    };

    let mut applied = 0;
    for section in sections {
        match SectionPayload::parse(section, &body) {
            Ok(payload) => {
                debug!("捕获{}响应: {}", section.label(), response.url);
                payload.apply(record);
                applied += 1;
            }
            Err(e) => warn!("{}响应结构不符 ({}): {}", section.label(), response.url, e),
        }
    }
    applied
}

// ========== 响应结构 ==========

#[derive(Deserialize)]
struct Envelope<T> {
    data: Option<T>,
}

#[derive(Deserialize)]
struct Required<T> {
    data: T,
}

#[derive(Deserialize)]
struct NamedEntity {
    #[serde(default)]
    name_en: Option<String>,
}

impl NamedEntity {
    fn name(self) -> String {
        self.name_en.unwrap_or_default()
    }
}

#[derive(Deserialize, Default)]
struct BasicData {
    #[serde(default)]
    entity: Option<BasicEntity>,
    #[serde(default)]
    secondary_details: Option<Vec<SecondaryDetail>>,
}

#[derive(Deserialize)]
struct BasicEntity {
    #[serde(default)]
    name_en: Option<String>,
    #[serde(default)]
    flags: Option<Vec<Flag>>,
}

#[derive(Deserialize)]
struct Flag {
    #[serde(default)]
    title: Option<String>,
}

#[derive(Deserialize)]
struct SecondaryDetail {
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    data: Option<JsonValue>,
}

impl BasicData {
    fn into_update(self) -> BasicInfoUpdate {
        let entity = self.entity.map(|entity| {
            let flags: Vec<String> = entity
                .flags
                .unwrap_or_default()
                .into_iter()
                .filter_map(|flag| flag.title)
                .collect();
            let government_ownership_fraction = flags
                .iter()
                .find(|flag| flag.contains(GOVERNMENT_OWNERSHIP_FLAG))
                .map(|flag| flag.rsplit(':').next().unwrap_or(flag).to_string());
            EntitySummary {
                display_name: entity.name_en.unwrap_or_default(),
                flags,
                government_ownership_fraction,
            }
        });

        let retrieval_date = self.secondary_details.map(|details| {
            details
                .into_iter()
                .find(|detail| detail.label.as_deref() == Some(RETRIEVAL_DATE_LABEL))
                .and_then(|detail| detail.data)
                .map(|data| match data {
                    JsonValue::String(s) => s,
                    JsonValue::Null => String::new(),
                    other => other.to_string(),
                })
                .unwrap_or_default()
        });

        BasicInfoUpdate {
            entity,
            retrieval_date,
        }
    }
}

#[derive(Deserialize)]
struct HistoricalData {
    entities: Vec<NamedEntity>,
    periods: Vec<JsonValue>,
    fractions: Vec<Vec<JsonValue>>,
}

impl HistoricalData {
    /// 第 i 个股东在第 j 期的比例为 `fractions[i][j]`
    fn into_shareholders(self) -> Vec<HistoricalShareholder> {
        let periods: Vec<String> = self
            .periods
            .into_iter()
            .map(|period| match period {
                JsonValue::String(s) => s,
                other => other.to_string(),
            })
            .collect();

        self.entities
            .into_iter()
            .enumerate()
            .map(|(i, entity)| {
                let row = self.fractions.get(i);
                let mut fractions = Map::new();
                for (j, period) in periods.iter().enumerate() {
                    if let Some(value) = row.and_then(|r| r.get(j)) {
                        fractions.insert(period.clone(), value.clone());
                    }
                }
                HistoricalShareholder {
                    name: entity.name(),
                    fractions,
                }
            })
            .collect()
    }
}

#[derive(Deserialize)]
struct StakeItem {
    entity: NamedEntity,
    #[serde(default)]
    fraction: Option<JsonValue>,
}

impl StakeItem {
    fn into_stake(self) -> Stake {
        Stake {
            name: self.entity.name(),
            fraction: self.fraction,
        }
    }
}

#[derive(Deserialize)]
struct OwnedData {
    #[serde(default)]
    owned: Option<Vec<StakeItem>>,
}

#[derive(Deserialize)]
struct OwnersData {
    #[serde(default)]
    owners: Option<Vec<StakeItem>>,
}

#[derive(Deserialize)]
struct EntitySetsData {
    #[serde(default)]
    entity_sets: Option<Vec<JsonValue>>,
}

#[derive(Deserialize)]
struct RelatedEntity {
    entity: NamedEntity,
    direct: DirectRelation,
}

#[derive(Deserialize)]
struct DirectRelation {
    ownership: Ownership,
}

#[derive(Deserialize)]
struct Ownership {
    #[serde(default)]
    fraction: Option<JsonValue>,
}

/// 只解析名为 "Beneficial Owners" 的实体集，其他实体集的结构不影响结果
fn beneficial_owners(data: Option<EntitySetsData>) -> Result<Option<Vec<Stake>>, serde_json::Error> {
    let set = data
        .and_then(|d| d.entity_sets)
        .unwrap_or_default()
        .into_iter()
        .find(|set| set.get("name").and_then(|n| n.as_str()) == Some(BENEFICIAL_OWNERS_SET));

    let Some(related) = set.and_then(|mut set| set.get_mut("related_entities").map(JsonValue::take)) else {
        return Ok(None);
    };
    if related.is_null() {
        return Ok(None);
    }

    let related: Vec<RelatedEntity> = serde_json::from_value(related)?;
    Ok(Some(
        related
            .into_iter()
            .map(|item| Stake {
                name: item.entity.name(),
                fraction: item.direct.ownership.fraction,
            })
            .collect(),
    ))
}

#[derive(Deserialize)]
struct TransactionsData {
    #[serde(default)]
    transactions: Option<Vec<TransactionItem>>,
}

#[derive(Deserialize)]
struct TransactionItem {
    #[serde(default)]
    supplier: Option<NamedEntity>,
    #[serde(default)]
    product: Option<Product>,
    #[serde(default)]
    amount: Option<JsonValue>,
    #[serde(default)]
    order_date: Option<JsonValue>,
}

#[derive(Deserialize)]
struct Product {
    #[serde(default)]
    name_en_short: Option<String>,
}

impl TransactionItem {
    /// 客户和供应商两类响应都以 `supplier` 作为交易对手
    fn into_transaction(self) -> Result<Transaction, serde_json::Error> {
        let entity = self
            .supplier
            .ok_or_else(|| <serde_json::Error as serde::de::Error>::missing_field("supplier"))?;
        Ok(Transaction {
            name: entity.name(),
            product: self.product.and_then(|p| p.name_en_short),
            amount: self.amount,
            date: self.order_date,
        })
    }
}

fn transactions(body: &JsonValue) -> Result<Vec<TransactionItem>, serde_json::Error> {
    let envelope = Envelope::<TransactionsData>::deserialize(body)?;
    Ok(envelope.data.and_then(|d| d.transactions).unwrap_or_default())
}
