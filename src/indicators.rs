use crate::adx::AverageDirectionalIndex;
use crate::models::CandleSeries;
use crate::money_flow::{ChaikinMoneyFlow, OnBalanceVolume};
use crate::wilder::{WilderAtr, WilderRsi};
use ta::Next;
use ta::errors::TaError;
use ta::indicators::{
    BollingerBands, ExponentialMovingAverage, MovingAverageConvergenceDivergence,
    SimpleMovingAverage,
};

/// Series shorter than this produce an all-undefined snapshot.
pub const MIN_BARS: usize = 60;

const RSI_PERIOD: usize = 14;
const ADX_PERIOD: usize = 14;
const ATR_PERIOD: usize = 14;
const MACD_FAST: usize = 12;
const MACD_SLOW: usize = 26;
const MACD_SIGNAL: usize = 9;
const BB_PERIOD: usize = 20;
const BB_MULT: f64 = 2.0;
const CMF_PERIOD: usize = 20;

/// Indicator values at one bar. `None` means "not computable yet", never zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IndicatorSnapshot {
    pub close: Option<f64>,
    pub volume: Option<f64>,
    pub ema9: Option<f64>,
    pub ema21: Option<f64>,
    pub ema50: Option<f64>,
    pub ema200: Option<f64>,
    pub sma20: Option<f64>,
    pub vol_sma20: Option<f64>,
    pub rsi14: Option<f64>,
    pub adx14: Option<f64>,
    pub macd_line: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_hist: Option<f64>,
    pub atr14: Option<f64>,
    pub atr_pct: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_lower: Option<f64>,
    pub bb_width: Option<f64>,
    pub cmf20: Option<f64>,
    pub obv: Option<f64>,
    pub obv_slope: Option<f64>,
}

impl IndicatorSnapshot {
    pub const FIELDS: [&'static str; 21] = [
        "close",
        "volume",
        "ema9",
        "ema21",
        "ema50",
        "ema200",
        "sma20",
        "vol_sma20",
        "rsi14",
        "adx14",
        "macd_line",
        "macd_signal",
        "macd_hist",
        "atr14",
        "atr_pct",
        "bb_upper",
        "bb_lower",
        "bb_width",
        "cmf20",
        "obv",
        "obv_slope",
    ];

    /// Looks a value up by indicator name. Unknown names read as undefined.
    pub fn get(&self, name: &str) -> Option<f64> {
        match name {
            "close" => self.close,
            "volume" => self.volume,
            "ema9" => self.ema9,
            "ema21" => self.ema21,
            "ema50" => self.ema50,
            "ema200" => self.ema200,
            "sma20" => self.sma20,
            "vol_sma20" => self.vol_sma20,
            "rsi14" => self.rsi14,
            "adx14" => self.adx14,
            "macd_line" => self.macd_line,
            "macd_signal" => self.macd_signal,
            "macd_hist" => self.macd_hist,
            "atr14" => self.atr14,
            "atr_pct" => self.atr_pct,
            "bb_upper" => self.bb_upper,
            "bb_lower" => self.bb_lower,
            "bb_width" => self.bb_width,
            "cmf20" => self.cmf20,
            "obv" => self.obv,
            "obv_slope" => self.obv_slope,
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        Self::FIELDS.iter().all(|name| self.get(name).is_none())
    }

    /// Last volume over its 20-bar average.
    pub fn volume_ratio(&self) -> Option<f64> {
        match (self.volume, self.vol_sma20) {
            (Some(volume), Some(avg)) if avg > 0.0 => Some(volume / avg),
            _ => None,
        }
    }
}

/// Indicator snapshots aligned one-to-one with the bars of a series.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorFrame {
    rows: Vec<IndicatorSnapshot>,
}

impl IndicatorFrame {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[IndicatorSnapshot] {
        &self.rows
    }

    /// Snapshot at the final bar; all-undefined for an empty frame.
    pub fn last(&self) -> IndicatorSnapshot {
        self.rows.last().copied().unwrap_or_default()
    }

    pub fn column(&self, name: &str) -> Vec<Option<f64>> {
        self.rows.iter().map(|row| row.get(name)).collect()
    }
}

/// Holds freshly constructed `ta` indicators and clones them per series, so
/// every computation starts from a clean state.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    ema9: ExponentialMovingAverage,
    ema21: ExponentialMovingAverage,
    ema50: ExponentialMovingAverage,
    ema200: ExponentialMovingAverage,
    sma20: SimpleMovingAverage,
    vol_sma20: SimpleMovingAverage,
    rsi: WilderRsi,
    macd: MovingAverageConvergenceDivergence,
    atr: WilderAtr,
    bb: BollingerBands,
}

impl IndicatorEngine {
    pub fn new() -> Result<Self, TaError> {
        Ok(Self {
            ema9: ExponentialMovingAverage::new(9)?,
            ema21: ExponentialMovingAverage::new(21)?,
            ema50: ExponentialMovingAverage::new(50)?,
            ema200: ExponentialMovingAverage::new(200)?,
            sma20: SimpleMovingAverage::new(20)?,
            vol_sma20: SimpleMovingAverage::new(20)?,
            rsi: WilderRsi::new(RSI_PERIOD),
            macd: MovingAverageConvergenceDivergence::new(MACD_FAST, MACD_SLOW, MACD_SIGNAL)?,
            atr: WilderAtr::new(ATR_PERIOD),
            bb: BollingerBands::new(BB_PERIOD, BB_MULT)?,
        })
    }

    /// Runs every indicator causally over the series, bar by bar.
    pub fn compute(&self, series: &CandleSeries) -> IndicatorFrame {
        if series.len() < MIN_BARS {
            return IndicatorFrame::default();
        }

        let mut ema9 = self.ema9.clone();
        let mut ema21 = self.ema21.clone();
        let mut ema50 = self.ema50.clone();
        let mut ema200 = self.ema200.clone();
        let mut sma20 = self.sma20.clone();
        let mut vol_sma20 = self.vol_sma20.clone();
        let mut rsi = self.rsi.clone();
        let mut macd = self.macd.clone();
        let mut atr = self.atr.clone();
        let mut bb = self.bb.clone();
        let mut adx = AverageDirectionalIndex::new(ADX_PERIOD);
        let mut cmf = ChaikinMoneyFlow::new(CMF_PERIOD);
        let mut obv = OnBalanceVolume::new();

        let mut rows = Vec::with_capacity(series.len());
        let mut prev_obv: Option<f64> = None;

        for (i, candle) in series.candles().iter().enumerate() {
            let n = i + 1;
            let close = candle.close;

            let ema9_v = ema9.next(close);
            let ema21_v = ema21.next(close);
            let ema50_v = ema50.next(close);
            let ema200_v = ema200.next(close);
            let sma20_v = sma20.next(close);
            let vol_sma20_v = vol_sma20.next(candle.volume);
            let rsi_v = rsi.next(close);
            let macd_v = macd.next(close);
            let atr_v = atr.next(candle);
            let bb_v = bb.next(close);
            let adx_v = adx.next(candle);
            let cmf_v = cmf.next(candle);
            let obv_v = obv.next(candle);

            let atr14 = atr_v.filter(|v| v.is_finite());
            let bb_upper = warm(n, BB_PERIOD, bb_v.upper);
            let bb_lower = warm(n, BB_PERIOD, bb_v.lower);

            rows.push(IndicatorSnapshot {
                close: Some(close),
                volume: Some(candle.volume),
                ema9: warm(n, 9, ema9_v),
                ema21: warm(n, 21, ema21_v),
                ema50: warm(n, 50, ema50_v),
                ema200: warm(n, 200, ema200_v),
                sma20: warm(n, 20, sma20_v),
                vol_sma20: warm(n, 20, vol_sma20_v),
                rsi14: rsi_v.filter(|v| v.is_finite()),
                adx14: adx_v.filter(|v| v.is_finite()),
                macd_line: warm(n, MACD_SLOW, macd_v.macd),
                macd_signal: warm(n, MACD_SLOW + MACD_SIGNAL - 1, macd_v.signal),
                macd_hist: warm(n, MACD_SLOW + MACD_SIGNAL - 1, macd_v.histogram),
                atr14,
                atr_pct: atr14.map(|atr| atr / close * 100.0),
                bb_upper,
                bb_lower,
                bb_width: bb_upper.zip(bb_lower).map(|(upper, lower)| (upper - lower) / close),
                cmf20: cmf_v.filter(|v| v.is_finite()),
                obv: Some(obv_v),
                obv_slope: prev_obv.map(|prev| obv_v - prev),
            });
            prev_obv = Some(obv_v);
        }

        IndicatorFrame { rows }
    }
}

fn warm(bars_seen: usize, needed: usize, value: f64) -> Option<f64> {
    (bars_seen >= needed && value.is_finite()).then_some(value)
}
