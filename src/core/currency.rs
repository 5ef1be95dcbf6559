// src/core/currency.rs — Destination → local currency lookup

use serde::Serialize;

/// Local currency of a destination with a fixed KRW conversion rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyInfo {
    /// Korean display name ("엔", "달러", …).
    pub name: &'static str,
    pub code: &'static str,
    pub symbol: &'static str,
    /// KRW for one unit of this currency.
    pub krw_rate: f64,
}

impl CurrencyInfo {
    const fn new(name: &'static str, code: &'static str, symbol: &'static str, krw_rate: f64) -> Self {
        Self {
            name,
            code,
            symbol,
            krw_rate,
        }
    }

    /// Convert an amount in this currency to whole KRW.
    pub fn to_krw(&self, amount: f64) -> u64 {
        (amount * self.krw_rate).round().max(0.0) as u64
    }
}

pub const USD: CurrencyInfo = CurrencyInfo::new("달러", "USD", "$", 1400.0);

/// Keyword groups checked in order; the first group with a substring hit wins.
/// Keywords are lowercase. Short tokens like "la " and "hk" are matched as-is.
pub const CURRENCY_TABLE: &[(&[&str], CurrencyInfo)] = &[
    (
        &[
            "도쿄", "오사카", "교토", "후쿠오카", "삿포로", "나고야", "tokyo", "osaka", "kyoto",
            "fukuoka", "sapporo", "nagoya",
        ],
        CurrencyInfo::new("엔", "JPY", "¥", 9.5),
    ),
    (
        &[
            "뉴욕", "로스앤젤레스", "샌프란시스코", "시애틀", "시카고", "라스베가스",
            "new york", "los angeles", "san francisco", "seattle", "chicago", "las vegas",
            "la ", "nyc", "sf",
        ],
        USD,
    ),
    (
        &[
            "파리", "베를린", "로마", "바르셀로나", "암스테르담", "빈", "paris", "berlin", "rome",
            "barcelona", "amsterdam", "vienna", "프랑크푸르트", "밀라노", "마드리드",
        ],
        CurrencyInfo::new("유로", "EUR", "€", 1500.0),
    ),
    (
        &["런던", "london", "맨체스터", "manchester", "에든버러", "edinburgh"],
        CurrencyInfo::new("파운드", "GBP", "£", 1800.0),
    ),
    (
        &[
            "베이징", "상하이", "광저우", "선전", "beijing", "shanghai", "guangzhou", "shenzhen",
            "청두", "항저우",
        ],
        CurrencyInfo::new("위안", "CNY", "¥", 190.0),
    ),
    (
        &["방콕", "bangkok", "푸켓", "phuket", "치앙마이", "chiang mai"],
        CurrencyInfo::new("바트", "THB", "฿", 40.0),
    ),
    (
        &["하노이", "호치민", "다낭", "hanoi", "ho chi minh", "danang", "호이안"],
        CurrencyInfo::new("동", "VND", "₫", 0.055),
    ),
    (
        &["싱가포르", "singapore"],
        CurrencyInfo::new("싱가포르 달러", "SGD", "S$", 1050.0),
    ),
    (
        &["홍콩", "hong kong", "hk"],
        CurrencyInfo::new("홍콩 달러", "HKD", "HK$", 180.0),
    ),
    (
        &["타이베이", "taipei", "타이중", "가오슝", "kaohsiung"],
        CurrencyInfo::new("대만 달러", "TWD", "NT$", 45.0),
    ),
    (
        &["시드니", "멜버른", "브리즈번", "sydney", "melbourne", "brisbane"],
        CurrencyInfo::new("호주 달러", "AUD", "A$", 950.0),
    ),
    (
        &["토론토", "밴쿠버", "몬트리올", "toronto", "vancouver", "montreal"],
        CurrencyInfo::new("캐나다 달러", "CAD", "C$", 1050.0),
    ),
    (
        &["서울", "부산", "제주", "seoul", "busan", "jeju"],
        CurrencyInfo::new("원", "KRW", "₩", 1.0),
    ),
];

/// Resolve the currency for a free-text destination. Unknown places get USD.
pub fn resolve(city: &str) -> CurrencyInfo {
    let city = city.to_lowercase();
    CURRENCY_TABLE
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| city.contains(k)))
        .map(|(_, info)| *info)
        .unwrap_or(USD)
}
