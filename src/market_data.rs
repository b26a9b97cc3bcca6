//! Market data lookups backed by Yahoo Finance.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Display;
use time::OffsetDateTime;
use tracing::debug;
use url::Url;
use yahoo_finance_api as yahoo;

use crate::error::MarketDataError;

pub type Result<T> = std::result::Result<T, MarketDataError>;

/// Column-oriented daily bars: `{column: {YYYY-MM-DD: value}}`.
pub type PriceHistory = BTreeMap<String, BTreeMap<String, f64>>;

/// Annual balance sheet: `{as_of_date: {line_item: value}}`.
pub type BalanceSheet = BTreeMap<String, BTreeMap<String, f64>>;

const YAHOO_QUERY_URL: &str = "https://query2.finance.yahoo.com";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
const NEWS_COUNT: u32 = 10;
const TIMESERIES_START: i64 = 493_590_046;

/// Every annual line item the fundamentals timeseries publishes for a balance sheet.
const BALANCE_SHEET_ITEMS: &[&str] = &[
    "TreasurySharesNumber",
    "PreferredSharesNumber",
    "OrdinarySharesNumber",
    "ShareIssued",
    "NetDebt",
    "TotalDebt",
    "TangibleBookValue",
    "InvestedCapital",
    "WorkingCapital",
    "NetTangibleAssets",
    "CapitalLeaseObligations",
    "CommonStockEquity",
    "PreferredStockEquity",
    "TotalCapitalization",
    "TotalEquityGrossMinorityInterest",
    "MinorityInterest",
    "StockholdersEquity",
    "OtherEquityInterest",
    "GainsLossesNotAffectingRetainedEarnings",
    "OtherEquityAdjustments",
    "FixedAssetsRevaluationReserve",
    "ForeignCurrencyTranslationAdjustments",
    "MinimumPensionLiabilities",
    "UnrealizedGainLoss",
    "TreasuryStock",
    "RetainedEarnings",
    "AdditionalPaidInCapital",
    "CapitalStock",
    "OtherCapitalStock",
    "CommonStock",
    "PreferredStock",
    "TotalPartnershipCapital",
    "GeneralPartnershipCapital",
    "LimitedPartnershipCapital",
    "TotalLiabilitiesNetMinorityInterest",
    "TotalNonCurrentLiabilitiesNetMinorityInterest",
    "OtherNonCurrentLiabilities",
    "LiabilitiesHeldforSaleNonCurrent",
    "RestrictedCommonStock",
    "PreferredSecuritiesOutsideStockEquity",
    "DerivativeProductLiabilities",
    "EmployeeBenefits",
    "NonCurrentPensionAndOtherPostretirementBenefitPlans",
    "NonCurrentAccruedExpenses",
    "DuetoRelatedPartiesNonCurrent",
    "TradeandOtherPayablesNonCurrent",
    "NonCurrentDeferredLiabilities",
    "NonCurrentDeferredRevenue",
    "NonCurrentDeferredTaxesLiabilities",
    "LongTermDebtAndCapitalLeaseObligation",
    "LongTermCapitalLeaseObligation",
    "LongTermDebt",
    "LongTermProvisions",
    "CurrentLiabilities",
    "OtherCurrentLiabilities",
    "CurrentDeferredLiabilities",
    "CurrentDeferredRevenue",
    "CurrentDeferredTaxesLiabilities",
    "CurrentDebtAndCapitalLeaseObligation",
    "CurrentCapitalLeaseObligation",
    "CurrentDebt",
    "OtherCurrentBorrowings",
    "LineOfCredit",
    "CommercialPaper",
    "CurrentNotesPayable",
    "PensionandOtherPostRetirementBenefitPlansCurrent",
    "CurrentProvisions",
    "PayablesAndAccruedExpenses",
    "CurrentAccruedExpenses",
    "InterestPayable",
    "Payables",
    "OtherPayable",
    "DuetoRelatedPartiesCurrent",
    "DividendsPayable",
    "TotalTaxPayable",
    "IncomeTaxPayable",
    "AccountsPayable",
    "TotalAssets",
    "TotalNonCurrentAssets",
    "OtherNonCurrentAssets",
    "DefinedPensionBenefit",
    "NonCurrentPrepaidAssets",
    "NonCurrentDeferredAssets",
    "NonCurrentDeferredTaxesAssets",
    "DuefromRelatedPartiesNonCurrent",
    "NonCurrentNoteReceivables",
    "NonCurrentAccountsReceivable",
    "FinancialAssets",
    "InvestmentsAndAdvances",
    "OtherInvestments",
    "InvestmentinFinancialAssets",
    "HeldToMaturitySecurities",
    "AvailableForSaleSecurities",
    "FinancialAssetsDesignatedasFairValueThroughProfitorLossTotal",
    "TradingSecurities",
    "LongTermEquityInvestment",
    "InvestmentsinJointVenturesatCost",
    "InvestmentsInOtherVenturesUnderEquityMethod",
    "InvestmentsinAssociatesatCost",
    "InvestmentsinSubsidiariesatCost",
    "InvestmentProperties",
    "GoodwillAndOtherIntangibleAssets",
    "OtherIntangibleAssets",
    "Goodwill",
    "NetPPE",
    "AccumulatedDepreciation",
    "GrossPPE",
    "Leases",
    "ConstructionInProgress",
    "OtherProperties",
    "MachineryFurnitureEquipment",
    "BuildingsAndImprovements",
    "LandAndImprovements",
    "Properties",
    "CurrentAssets",
    "OtherCurrentAssets",
    "HedgingAssetsCurrent",
    "AssetsHeldForSaleCurrent",
    "CurrentDeferredAssets",
    "CurrentDeferredTaxesAssets",
    "RestrictedCash",
    "PrepaidAssets",
    "Inventory",
    "InventoriesAdjustmentsAllowances",
    "OtherInventories",
    "FinishedGoods",
    "WorkInProcess",
    "RawMaterials",
    "Receivables",
    "ReceivablesAdjustmentsAllowances",
    "OtherReceivables",
    "DuefromRelatedPartiesCurrent",
    "TaxesReceivable",
    "AccruedInterestReceivable",
    "NotesReceivable",
    "LoansReceivable",
    "AccountsReceivable",
    "AllowanceForDoubtfulAccountsReceivable",
    "GrossAccountsReceivable",
    "CashCashEquivalentsAndShortTermInvestments",
    "OtherShortTermInvestments",
    "CashAndCashEquivalents",
    "CashEquivalents",
    "CashFinancial",
];

#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adjclose: f64,
    pub volume: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    #[serde(default)]
    pub uuid: String,
    pub title: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub provider_publish_time: i64,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub related_tickers: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    news: Vec<NewsItem>,
}

/// Read-only market data for a ticker. Every call is a fresh upstream request.
#[async_trait]
pub trait MarketData: Send + Sync {
    async fn latest_close(&self, ticker: &str) -> Result<f64>;

    /// Daily bars over `[start_date, end_date)`, dates as `YYYY-MM-DD`.
    async fn price_history(
        &self,
        ticker: &str,
        start_date: &str,
        end_date: &str,
    ) -> Result<PriceHistory>;

    async fn balance_sheet(&self, ticker: &str) -> Result<BalanceSheet>;

    async fn news(&self, ticker: &str) -> Result<Vec<NewsItem>>;
}

pub fn tabulate(bars: &[PriceBar]) -> PriceHistory {
    let mut history = PriceHistory::new();
    for bar in bars {
        let date = bar.date.format("%Y-%m-%d").to_string();
        let columns = [
            ("Open", bar.open),
            ("High", bar.high),
            ("Low", bar.low),
            ("Close", bar.close),
            ("Adj Close", bar.adjclose),
            ("Volume", bar.volume as f64),
        ];
        for (column, value) in columns {
            history
                .entry(column.to_string())
                .or_default()
                .insert(date.clone(), value);
        }
    }
    history
}

pub struct YahooFinance {
    http: Client,
    query_url: String,
}

impl YahooFinance {
    pub fn new() -> Result<Self> {
        Self::with_query_url(YAHOO_QUERY_URL)
    }

    /// Points the balance-sheet and news lookups at another host.
    pub fn with_query_url(query_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            http,
            query_url: query_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn get_json(&self, url: Url) -> Result<Value> {
        debug!(url = %url, "fetching market data");
        let response = self.http.get(url.as_str()).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MarketDataError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl MarketData for YahooFinance {
    async fn latest_close(&self, ticker: &str) -> Result<f64> {
        let ticker = check_ticker(ticker)?;
        let response = connector()?
            .get_latest_quotes(ticker, "1d")
            .await
            .map_err(provider)?;
        let quotes = response.quotes().map_err(provider)?;
        last_close(ticker, &quotes)
    }

    async fn price_history(
        &self,
        ticker: &str,
        start_date: &str,
        end_date: &str,
    ) -> Result<PriceHistory> {
        let ticker = check_ticker(ticker)?;
        let start = to_offset(parse_date(start_date)?)?;
        let end = to_offset(parse_date(end_date)?)?;

        let response = connector()?
            .get_quote_history(ticker, start, end)
            .await
            .map_err(provider)?;
        let quotes = response.quotes().map_err(provider)?;
        history_from_quotes(ticker, &quotes)
    }

    async fn balance_sheet(&self, ticker: &str) -> Result<BalanceSheet> {
        let ticker = check_ticker(ticker)?;
        let mut url = Url::parse(&format!(
            "{}/ws/fundamentals-timeseries/v1/finance/timeseries",
            self.query_url
        ))?;
        url.path_segments_mut()
            .map_err(|()| provider(format!("not a base url: {}", self.query_url)))?
            .push(ticker);
        let types = BALANCE_SHEET_ITEMS
            .iter()
            .map(|item| format!("annual{item}"))
            .collect::<Vec<_>>()
            .join(",");
        url.query_pairs_mut()
            .append_pair("symbol", ticker)
            .append_pair("type", &types)
            .append_pair("period1", &TIMESERIES_START.to_string())
            .append_pair("period2", &Utc::now().timestamp().to_string());

        let sheet = parse_balance_sheet(&self.get_json(url).await?)?;
        if sheet.is_empty() {
            return Err(no_data(ticker, "balance sheet"));
        }
        Ok(sheet)
    }

    async fn news(&self, ticker: &str) -> Result<Vec<NewsItem>> {
        let ticker = check_ticker(ticker)?;
        let mut url = Url::parse(&format!("{}/v1/finance/search", self.query_url))?;
        url.query_pairs_mut()
            .append_pair("q", ticker)
            .append_pair("quotesCount", "0")
            .append_pair("newsCount", &NEWS_COUNT.to_string());

        let response: SearchResponse = serde_json::from_value(self.get_json(url).await?)?;
        Ok(response.news)
    }
}

fn connector() -> Result<yahoo::YahooConnector> {
    yahoo::YahooConnector::new().map_err(provider)
}

fn provider(err: impl Display) -> MarketDataError {
    MarketDataError::Provider(err.to_string())
}

fn check_ticker(ticker: &str) -> Result<&str> {
    let ticker = ticker.trim();
    if ticker.is_empty() {
        return Err(MarketDataError::InvalidTicker(ticker.to_string()));
    }
    Ok(ticker)
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|source| {
        MarketDataError::InvalidDate {
            value: value.to_string(),
            source,
        }
    })
}

fn to_offset(date: NaiveDate) -> Result<OffsetDateTime> {
    let timestamp = date
        .and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc().timestamp())
        .ok_or_else(|| provider(format!("date out of range: {date}")))?;
    OffsetDateTime::from_unix_timestamp(timestamp).map_err(provider)
}

fn no_data(ticker: &str, what: &'static str) -> MarketDataError {
    MarketDataError::NoData {
        ticker: ticker.to_string(),
        what,
    }
}

fn last_close(ticker: &str, quotes: &[yahoo::Quote]) -> Result<f64> {
    quotes
        .last()
        .map(|quote| quote.close)
        .ok_or_else(|| no_data(ticker, "latest price"))
}

/// Daily quotes keyed by their UTC calendar date.
fn history_from_quotes(ticker: &str, quotes: &[yahoo::Quote]) -> Result<PriceHistory> {
    let bars: Vec<PriceBar> = quotes
        .iter()
        .filter_map(|quote| {
            let timestamp = i64::try_from(quote.timestamp).ok()?;
            let date = DateTime::from_timestamp(timestamp, 0)?.date_naive();
            Some(PriceBar {
                date,
                open: quote.open,
                high: quote.high,
                low: quote.low,
                close: quote.close,
                adjclose: quote.adjclose,
                volume: quote.volume,
            })
        })
        .collect();

    if bars.is_empty() {
        return Err(no_data(ticker, "price history"));
    }
    Ok(tabulate(&bars))
}

/// Folds a fundamentals-timeseries payload into `{as_of_date: {item: value}}`.
fn parse_balance_sheet(body: &Value) -> Result<BalanceSheet> {
    if let Some(error) = body.pointer("/timeseries/error").filter(|e| !e.is_null()) {
        let description = error
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(MarketDataError::Provider(description));
    }

    let mut sheet = BalanceSheet::new();
    let series = body
        .pointer("/timeseries/result")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    for entry in series {
        let Some(kind) = entry.pointer("/meta/type/0").and_then(Value::as_str) else {
            continue;
        };
        let Some(points) = entry.get(kind).and_then(Value::as_array) else {
            continue;
        };
        let item = kind.strip_prefix("annual").unwrap_or(kind);

        for point in points {
            let date = point.get("asOfDate").and_then(Value::as_str);
            let value = point.pointer("/reportedValue/raw").and_then(Value::as_f64);
            if let (Some(date), Some(value)) = (date, value) {
                sheet
                    .entry(date.to_string())
                    .or_default()
                    .insert(item.to_string(), value);
            }
        }
    }

    Ok(sheet)
}
