//! Declarative indicator definitions.
//!
//! Each indicator is data: the series it reads, the metric it classifies, how
//! its changes are expressed and its bucket table. A single evaluator in
//! [`crate::report`] serves every entry. Orientation and comparison operators
//! are intentionally per table; some read "high = risk", others "low = risk".

use std::collections::HashSet;

use serde::Serialize;

use crate::change::ChangeMode;
use crate::regime::{Bucket, Severity, ThresholdTable};
use crate::{CoreError, Frequency, SeriesSymbol, ValidationError};

const RISK: &str = "risk_assessment";
const IMPLICATION: &str = "market_implication";
const POLICY: &str = "policy_signal";
const RISK_LEVEL: &str = "risk_level";

/// Value that the table classifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Metric {
    /// Latest observation.
    Level,
    /// Percent change over one year of observations.
    YearOverYear,
    /// Annualized volatility of the trailing `window` simple returns, in percent.
    AnnualizedVolatility { window: usize },
}

impl Metric {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Level => "level",
            Self::YearOverYear => "year_over_year",
            Self::AnnualizedVolatility { .. } => "annualized_volatility",
        }
    }

    /// Observations needed before the metric can be computed.
    pub fn min_observations(self, frequency: Frequency) -> usize {
        match self {
            Self::Level => 1,
            Self::YearOverYear => frequency.observations_per_year() + 1,
            Self::AnnualizedVolatility { .. } => 3,
        }
    }
}

/// Everything needed to evaluate one indicator.
#[derive(Debug, Clone, Serialize)]
pub struct IndicatorSpec {
    /// Fixed short key in the risk matrix.
    pub key: String,
    pub symbol: SeriesSymbol,
    pub metric: Metric,
    pub change_mode: ChangeMode,
    /// Whether to report the one-year percentile rank of the latest value.
    pub percentile: bool,
    pub table: ThresholdTable,
}

impl IndicatorSpec {
    pub fn new(
        key: impl Into<String>,
        symbol: SeriesSymbol,
        metric: Metric,
        change_mode: ChangeMode,
        table: ThresholdTable,
    ) -> Self {
        Self {
            key: key.into(),
            symbol,
            metric,
            change_mode,
            percentile: false,
            table,
        }
    }

    pub fn with_percentile(mut self) -> Self {
        self.percentile = true;
        self
    }
}

/// Ordered set of indicator specs with unique keys.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct IndicatorRegistry {
    specs: Vec<IndicatorSpec>,
}

impl IndicatorRegistry {
    pub fn new(specs: Vec<IndicatorSpec>) -> Result<Self, ValidationError> {
        let mut seen = HashSet::with_capacity(specs.len());
        for spec in &specs {
            let valid_key = !spec.key.is_empty()
                && spec
                    .key
                    .chars()
                    .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_');
            if !valid_key {
                return Err(ValidationError::InvalidIndicatorKey {
                    key: spec.key.clone(),
                });
            }
            if !seen.insert(spec.key.as_str()) {
                return Err(ValidationError::DuplicateIndicatorKey {
                    key: spec.key.clone(),
                });
            }
        }
        Ok(Self { specs })
    }

    pub fn specs(&self) -> &[IndicatorSpec] {
        &self.specs
    }

    pub fn get(&self, key: &str) -> Option<&IndicatorSpec> {
        self.specs.iter().find(|spec| spec.key == key)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// The built-in dashboard indicators. Every table is validated here, so a
    /// malformed table stops the program at startup.
    pub fn standard() -> Result<Self, CoreError> {
        let specs = vec![
            vix()?,
            yield_curve_10y2y()?,
            yield_curve_10y3m()?,
            high_yield_spread()?,
            investment_grade_spread()?,
            financial_stress()?,
            fed_funds()?,
            treasury_10y()?,
            real_yield_10y()?,
            breakeven_inflation()?,
            dollar_index()?,
            oil()?,
            unemployment()?,
            cpi_inflation()?,
            consumer_sentiment()?,
            market_volatility("sp500", "^GSPC")?,
            market_volatility("nasdaq", "^IXIC")?,
            market_volatility("dow_jones", "^DJI")?,
            market_volatility("shanghai_composite", "000001.SS")?,
            market_volatility("hang_seng", "^HSI")?,
        ];
        Ok(Self::new(specs)?)
    }
}

fn bucket(label: &str, severity: Severity, risk: &str, implication: &str) -> Bucket {
    Bucket::new(label, severity)
        .narrative(RISK, risk)
        .narrative(IMPLICATION, implication)
}

fn vix() -> Result<IndicatorSpec, CoreError> {
    let table = ThresholdTable::ascending()
        .below(
            15.0,
            bucket(
                "低波动制度",
                Severity::Low,
                "市场情绪平稳，尾部风险定价偏低",
                "适合持有风险资产，警惕波动率均值回归",
            ),
        )
        .below(
            25.0,
            bucket(
                "正常波动制度",
                Severity::Moderate,
                "波动处于历史常态区间",
                "维持标准仓位与对冲比例",
            ),
        )
        .below(
            40.0,
            bucket(
                "压力波动制度",
                Severity::Elevated,
                "避险需求上升，风险偏好回落",
                "降低杠杆，增加防御性配置",
            ),
        )
        .otherwise(bucket(
            "恐慌波动制度",
            Severity::Severe,
            "市场进入恐慌状态，流动性可能枯竭",
            "优先保护本金，关注政策干预信号",
        ))?;
    Ok(IndicatorSpec::new(
        "vix",
        SeriesSymbol::parse("VIXCLS")?,
        Metric::Level,
        ChangeMode::Percent,
        table,
    )
    .with_percentile())
}

fn yield_curve_10y2y() -> Result<IndicatorSpec, CoreError> {
    let table = ThresholdTable::ascending()
        .below(
            -0.5,
            bucket(
                "深度倒挂",
                Severity::Severe,
                "衰退预警信号强烈",
                "经济放缓预期占主导，偏好久期与防御板块",
            )
            .narrative(POLICY, "市场定价大幅降息"),
        )
        .below(
            0.0,
            bucket(
                "收益率曲线倒挂",
                Severity::Elevated,
                "历史上领先衰退6-18个月",
                "银行净息差承压，周期股表现偏弱",
            )
            .narrative(POLICY, "货币政策处于限制性区间"),
        )
        .below(
            1.0,
            bucket("曲线平坦", Severity::Moderate, "增长预期温和", "期限溢价偏低，关注曲线方向变化")
                .narrative(POLICY, "政策接近中性"),
        )
        .otherwise(
            bucket("曲线陡峭", Severity::Low, "增长与通胀预期回升", "利好金融与周期板块")
                .narrative(POLICY, "政策偏宽松或处于降息后期"),
        )?;
    Ok(IndicatorSpec::new(
        "yield_curve_10y2y",
        SeriesSymbol::parse("T10Y2Y")?,
        Metric::Level,
        ChangeMode::BasisPoints,
        table,
    )
    .with_percentile())
}

fn yield_curve_10y3m() -> Result<IndicatorSpec, CoreError> {
    let table = ThresholdTable::descending()
        .above(
            1.5,
            bucket("正常陡峭", Severity::Low, "期限结构健康", "经济扩张期特征")
                .narrative(POLICY, "无明显紧缩压力"),
        )
        .above(
            0.0,
            bucket("趋于平坦", Severity::Moderate, "增长动能放缓", "关注后续是否倒挂")
                .narrative(POLICY, "政策利率接近长端利率"),
        )
        .above(
            -1.0,
            bucket(
                "曲线倒挂",
                Severity::Elevated,
                "联储研究中最可靠的衰退前瞻指标发出警告",
                "降低周期敞口",
            )
            .narrative(POLICY, "短端利率高于长端，政策偏紧"),
        )
        .otherwise(
            bucket("深度倒挂", Severity::Severe, "衰退概率显著上升", "防御为主，等待曲线重新陡峭化")
                .narrative(POLICY, "政策显著紧缩"),
        )?;
    Ok(IndicatorSpec::new(
        "yield_curve_10y3m",
        SeriesSymbol::parse("T10Y3M")?,
        Metric::Level,
        ChangeMode::BasisPoints,
        table,
    ))
}

fn high_yield_spread() -> Result<IndicatorSpec, CoreError> {
    let table = ThresholdTable::ascending()
        .below(
            3.5,
            bucket(
                "信用环境宽松",
                Severity::Low,
                "违约预期低，信用风险定价偏乐观",
                "风险资产融资条件友好",
            ),
        )
        .below(
            5.0,
            bucket("信用环境正常", Severity::Moderate, "信用利差处于历史中枢", "信用市场运行平稳"),
        )
        .below(
            7.0,
            bucket(
                "信用环境收紧",
                Severity::Elevated,
                "投资者要求更高风险补偿",
                "高杠杆企业再融资压力上升",
            ),
        )
        .otherwise(bucket(
            "信用危机",
            Severity::Severe,
            "违约潮风险显著",
            "信用市场功能受损，风险资产承压",
        ))?;
    Ok(IndicatorSpec::new(
        "high_yield_spread",
        SeriesSymbol::parse("BAMLH0A0HYM2")?,
        Metric::Level,
        ChangeMode::BasisPoints,
        table,
    )
    .with_percentile())
}

fn investment_grade_spread() -> Result<IndicatorSpec, CoreError> {
    let table = ThresholdTable::ascending()
        .at_most(1.0, bucket("利差极窄", Severity::Low, "优质信用需求旺盛", "企业发债窗口畅通"))
        .below(1.5, bucket("利差正常", Severity::Moderate, "投资级信用稳定", "维持信用配置"))
        .below(2.5, bucket("利差走阔", Severity::Elevated, "信用风险溢价上升", "关注企业盈利下修"))
        .otherwise(bucket(
            "信用紧缩",
            Severity::Severe,
            "连优质发行人也面临融资压力",
            "系统性风险上升",
        ))?;
    Ok(IndicatorSpec::new(
        "investment_grade_spread",
        SeriesSymbol::parse("BAMLC0A0CM")?,
        Metric::Level,
        ChangeMode::BasisPoints,
        table,
    ))
}

fn financial_stress() -> Result<IndicatorSpec, CoreError> {
    let table = ThresholdTable::ascending()
        .at_most(-0.5, bucket("低金融压力", Severity::Low, "金融条件宽松", "风险偏好较高"))
        .at_most(
            0.5,
            bucket("正常金融压力", Severity::Moderate, "金融条件接近历史均值", "市场运行正常"),
        )
        .at_most(
            1.5,
            bucket("高金融压力", Severity::Elevated, "融资与流动性条件恶化", "降低风险敞口"),
        )
        .otherwise(bucket(
            "系统性金融压力",
            Severity::Severe,
            "金融体系承受显著压力",
            "流动性优先，警惕连锁反应",
        ))?;
    Ok(IndicatorSpec::new(
        "financial_stress",
        SeriesSymbol::parse("STLFSI4")?,
        Metric::Level,
        ChangeMode::Absolute,
        table,
    )
    .with_percentile())
}

fn fed_funds() -> Result<IndicatorSpec, CoreError> {
    let table = ThresholdTable::ascending()
        .below(
            1.0,
            bucket("超宽松货币政策", Severity::Low, "资金成本极低", "估值扩张环境")
                .narrative(POLICY, "零利率或接近零利率"),
        )
        .below(
            3.0,
            bucket("中性偏松", Severity::Moderate, "资金成本温和", "支持经济增长")
                .narrative(POLICY, "政策利率低于或接近中性水平"),
        )
        .below(
            5.0,
            bucket(
                "限制性货币政策",
                Severity::Elevated,
                "融资成本上升抑制需求",
                "估值承压，现金收益具吸引力",
            )
            .narrative(POLICY, "政策利率高于中性水平"),
        )
        .otherwise(
            bucket(
                "高度紧缩",
                Severity::Severe,
                "高利率可能引发金融脆弱点暴露",
                "关注信用事件与降息拐点",
            )
            .narrative(POLICY, "政策利率处于周期高位"),
        )?;
    Ok(IndicatorSpec::new(
        "fed_funds",
        SeriesSymbol::parse("DFF")?,
        Metric::Level,
        ChangeMode::BasisPoints,
        table,
    ))
}

fn treasury_10y() -> Result<IndicatorSpec, CoreError> {
    let table = ThresholdTable::ascending()
        .below(2.0, bucket("低利率环境", Severity::Low, "长期资金成本低", "利好成长股与地产"))
        .below(3.5, bucket("中性利率", Severity::Moderate, "长端利率处于常态", "股债配置均衡"))
        .below(
            5.0,
            bucket("高利率环境", Severity::Elevated, "贴现率上升压制估值", "债券配置价值提升"),
        )
        .otherwise(bucket(
            "利率冲击",
            Severity::Severe,
            "长端利率飙升冲击资产定价",
            "警惕股债双杀",
        ))?;
    Ok(IndicatorSpec::new(
        "treasury_10y",
        SeriesSymbol::parse("DGS10")?,
        Metric::Level,
        ChangeMode::BasisPoints,
        table,
    )
    .with_percentile())
}

fn real_yield_10y() -> Result<IndicatorSpec, CoreError> {
    let table = ThresholdTable::ascending()
        .below(0.0, bucket("负实际利率", Severity::Low, "实际融资成本为负", "利好黄金与长久期资产"))
        .below(
            1.0,
            bucket("低实际利率", Severity::Moderate, "金融条件偏宽松", "风险资产估值有支撑"),
        )
        .below(
            2.0,
            bucket("实际利率偏紧", Severity::Elevated, "真实回报要求上升", "高估值资产承压"),
        )
        .otherwise(bucket(
            "实际利率显著紧缩",
            Severity::Severe,
            "金融条件明显收紧",
            "压制黄金与成长股",
        ))?;
    Ok(IndicatorSpec::new(
        "real_yield_10y",
        SeriesSymbol::parse("DFII10")?,
        Metric::Level,
        ChangeMode::BasisPoints,
        table,
    ))
}

fn breakeven_inflation() -> Result<IndicatorSpec, CoreError> {
    let table = ThresholdTable::ascending()
        .below(
            1.5,
            bucket("通缩担忧", Severity::Elevated, "通胀预期过低，需求疲弱", "关注宽松政策预期"),
        )
        .below(2.5, bucket("通胀预期锚定", Severity::Low, "通胀预期与政策目标一致", "宏观环境稳定"))
        .below(
            3.0,
            bucket("通胀预期升温", Severity::Moderate, "通胀预期高于目标", "实物资产具对冲价值"),
        )
        .otherwise(bucket(
            "通胀预期失锚",
            Severity::Severe,
            "通胀预期脱离政策目标",
            "政策被迫持续紧缩",
        ))?;
    Ok(IndicatorSpec::new(
        "breakeven_inflation",
        SeriesSymbol::parse("T10YIE")?,
        Metric::Level,
        ChangeMode::BasisPoints,
        table,
    ))
}

fn dollar_index() -> Result<IndicatorSpec, CoreError> {
    let table = ThresholdTable::ascending()
        .below(
            110.0,
            bucket("美元弱势", Severity::Low, "全球美元流动性充裕", "利好新兴市场与大宗商品"),
        )
        .below(120.0, bucket("美元中性", Severity::Moderate, "汇率环境平稳", "跨境资本流动正常"))
        .below(
            128.0,
            bucket("美元强势", Severity::Elevated, "全球美元融资收紧", "新兴市场资本外流压力"),
        )
        .otherwise(bucket("美元极强", Severity::Severe, "美元荒风险", "全球风险资产普遍承压"))?;
    Ok(IndicatorSpec::new(
        "dollar_index",
        SeriesSymbol::parse("DTWEXBGS")?,
        Metric::Level,
        ChangeMode::Percent,
        table,
    )
    .with_percentile())
}

fn oil() -> Result<IndicatorSpec, CoreError> {
    let table = ThresholdTable::ascending()
        .below(
            50.0,
            bucket("低油价", Severity::Moderate, "需求疲弱或供给过剩", "能源板块承压，通胀下行"),
        )
        .below(85.0, bucket("油价正常", Severity::Low, "供需基本平衡", "对经济影响中性"))
        .below(110.0, bucket("高油价", Severity::Elevated, "输入性通胀压力", "消费支出受挤压"))
        .otherwise(bucket("油价冲击", Severity::Severe, "能源供给冲击", "滞胀风险上升"))?;
    Ok(IndicatorSpec::new(
        "oil",
        SeriesSymbol::parse("DCOILWTICO")?,
        Metric::Level,
        ChangeMode::Percent,
        table,
    ))
}

fn unemployment() -> Result<IndicatorSpec, CoreError> {
    let table = ThresholdTable::ascending()
        .at_most(
            4.0,
            bucket("充分就业", Severity::Low, "劳动力市场紧张", "工资通胀压力存在")
                .narrative(POLICY, "就业目标已达成"),
        )
        .at_most(
            5.5,
            bucket("就业健康", Severity::Moderate, "劳动力市场平衡", "消费基础稳固")
                .narrative(POLICY, "政策关注通胀目标"),
        )
        .at_most(
            7.0,
            bucket("就业走弱", Severity::Elevated, "裁员增加，需求放缓", "周期板块盈利下修")
                .narrative(POLICY, "降息概率上升"),
        )
        .otherwise(
            bucket("衰退级失业", Severity::Severe, "经济处于衰退区间", "防御资产占优")
                .narrative(POLICY, "大规模宽松政策"),
        )?;
    Ok(IndicatorSpec::new(
        "unemployment",
        SeriesSymbol::parse("UNRATE")?,
        Metric::Level,
        ChangeMode::BasisPoints,
        table,
    )
    .with_percentile())
}

fn cpi_inflation() -> Result<IndicatorSpec, CoreError> {
    let table = ThresholdTable::ascending()
        .below(
            1.0,
            bucket("低通胀", Severity::Moderate, "通胀低于目标，需求不足", "宽松政策空间大")
                .narrative(POLICY, "倾向放松"),
        )
        .at_most(
            2.5,
            bucket("通胀目标区间", Severity::Low, "物价稳定", "宏观环境友好")
                .narrative(POLICY, "维持中性"),
        )
        .below(
            4.0,
            bucket("通胀偏高", Severity::Elevated, "通胀粘性上升", "实际收益受侵蚀")
                .narrative(POLICY, "偏向紧缩"),
        )
        .otherwise(
            bucket("高通胀", Severity::Severe, "通胀失控风险", "现金与债券实际回报为负")
                .narrative(POLICY, "持续加息"),
        )?;
    Ok(IndicatorSpec::new(
        "cpi_inflation",
        SeriesSymbol::parse("CPIAUCSL")?,
        Metric::YearOverYear,
        ChangeMode::Percent,
        table,
    ))
}

fn consumer_sentiment() -> Result<IndicatorSpec, CoreError> {
    let table = ThresholdTable::descending()
        .at_least(90.0, bucket("消费者乐观", Severity::Low, "家庭支出意愿强", "利好可选消费"))
        .at_least(75.0, bucket("消费者信心中性", Severity::Moderate, "消费稳定", "关注收入增长"))
        .at_least(60.0, bucket("消费者悲观", Severity::Elevated, "支出意愿下降", "可选消费承压"))
        .otherwise(bucket("消费者极度悲观", Severity::Severe, "信心接近历史低位", "衰退风险上升"))?;
    Ok(IndicatorSpec::new(
        "consumer_sentiment",
        SeriesSymbol::parse("UMCSENT")?,
        Metric::Level,
        ChangeMode::Percent,
        table,
    ))
}

/// Equity index panel: realized volatility over roughly one trading month.
fn market_volatility(key: &str, symbol: &str) -> Result<IndicatorSpec, CoreError> {
    let table = ThresholdTable::descending()
        .above(
            25.0,
            bucket("高风险", Severity::Elevated, "年化波动率超过25%", "控制仓位，提高对冲比例")
                .narrative(RISK_LEVEL, "High"),
        )
        .above(
            15.0,
            bucket("中风险", Severity::Moderate, "年化波动率处于15%-25%", "维持常规风险预算")
                .narrative(RISK_LEVEL, "Medium"),
        )
        .otherwise(
            bucket("低风险", Severity::Low, "年化波动率低于15%", "波动环境平稳")
                .narrative(RISK_LEVEL, "Low"),
        )?;
    Ok(IndicatorSpec::new(
        key,
        SeriesSymbol::parse(symbol)?,
        Metric::AnnualizedVolatility { window: 21 },
        ChangeMode::Percent,
        table,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_builds_and_keys_are_unique() {
        let registry = IndicatorRegistry::standard().expect("standard tables are valid");
        assert_eq!(registry.len(), 20);
        assert!(registry.get("vix").is_some());
        assert!(registry.get("hang_seng").is_some());
    }

    #[test]
    fn standard_vix_table_matches_dashboard_labels() {
        let registry = IndicatorRegistry::standard().expect("registry");
        let vix = registry.get("vix").expect("vix");
        assert_eq!(vix.table.classify(12.0).label(), "低波动制度");
        assert_eq!(vix.table.classify(25.0).label(), "压力波动制度");
        assert_eq!(vix.table.classify(40.0).label(), "恐慌波动制度");
    }

    #[test]
    fn volatility_panel_keeps_strict_greater_than() {
        let registry = IndicatorRegistry::standard().expect("registry");
        let sp500 = registry.get("sp500").expect("sp500");
        assert_eq!(sp500.table.classify(25.0).label(), "中风险");
        assert_eq!(sp500.table.classify(15.0).label(), "低风险");
        assert_eq!(
            sp500
                .table
                .classify(25.01)
                .narrative_fields()
                .get("risk_level")
                .map(String::as_str),
            Some("High")
        );
    }

    #[test]
    fn rejects_duplicate_keys() {
        let spec = vix().expect("vix");
        let err = IndicatorRegistry::new(vec![spec.clone(), spec]).expect_err("must fail");
        assert!(matches!(err, ValidationError::DuplicateIndicatorKey { .. }));
    }
}
