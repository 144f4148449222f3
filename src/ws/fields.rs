//! Positional field schemas for every streamer service.
//!
//! Data pushes key their values by small integers (`"0"`, `"1"`, …). Each
//! table below is indexed by that integer: `LEVELONE_EQUITIES[1]` is the name
//! of wire key `"1"`. The tables are wire contracts; reordering an entry
//! changes the meaning of every frame for that service.

use crate::types::enums::Service;

// ---------------------------------------------------------------------------
// Level one
// ---------------------------------------------------------------------------

pub const LEVELONE_EQUITIES: &[&str] = &[
    "SYMBOL",                         // 0
    "BID_PRICE",                      // 1
    "ASK_PRICE",                      // 2
    "LAST_PRICE",                     // 3
    "BID_SIZE",                       // 4
    "ASK_SIZE",                       // 5
    "ASK_ID",                         // 6
    "BID_ID",                         // 7
    "TOTAL_VOLUME",                   // 8
    "LAST_SIZE",                      // 9
    "HIGH_PRICE",                     // 10
    "LOW_PRICE",                      // 11
    "CLOSE_PRICE",                    // 12
    "EXCHANGE_ID",                    // 13
    "MARGINABLE",                     // 14
    "DESCRIPTION",                    // 15
    "LAST_ID",                        // 16
    "OPEN_PRICE",                     // 17
    "NET_CHANGE",                     // 18
    "HIGH_PRICE_52_WEEK",             // 19
    "LOW_PRICE_52_WEEK",              // 20
    "PE_RATIO",                       // 21
    "DIVIDEND_AMOUNT",                // 22
    "DIVIDEND_YIELD",                 // 23
    "NAV",                            // 24
    "EXCHANGE_NAME",                  // 25
    "DIVIDEND_DATE",                  // 26
    "REGULAR_MARKET_QUOTE",           // 27
    "REGULAR_MARKET_TRADE",           // 28
    "REGULAR_MARKET_LAST_PRICE",      // 29
    "REGULAR_MARKET_LAST_SIZE",       // 30
    "REGULAR_MARKET_NET_CHANGE",      // 31
    "SECURITY_STATUS",                // 32
    "MARK",                           // 33
    "QUOTE_TIME_MILLIS",              // 34
    "TRADE_TIME_MILLIS",              // 35
    "REGULAR_MARKET_TRADE_MILLIS",    // 36
    "BID_TIME_MILLIS",                // 37
    "ASK_TIME_MILLIS",                // 38
    "ASK_MIC_ID",                     // 39
    "BID_MIC_ID",                     // 40
    "LAST_MIC_ID",                    // 41
    "NET_CHANGE_PERCENT",             // 42
    "REGULAR_MARKET_CHANGE_PERCENT",  // 43
    "MARK_CHANGE",                    // 44
    "MARK_CHANGE_PERCENT",            // 45
    "HTB_QUANTITY",                   // 46
    "HTB_RATE",                       // 47
    "HARD_TO_BORROW",                 // 48
    "IS_SHORTABLE",                   // 49
    "POST_MARKET_NET_CHANGE",         // 50
    "POST_MARKET_NET_CHANGE_PERCENT", // 51
];

pub const LEVELONE_OPTIONS: &[&str] = &[
    "SYMBOL",                   // 0
    "DESCRIPTION",              // 1
    "BID_PRICE",                // 2
    "ASK_PRICE",                // 3
    "LAST_PRICE",               // 4
    "HIGH_PRICE",               // 5
    "LOW_PRICE",                // 6
    "CLOSE_PRICE",              // 7
    "TOTAL_VOLUME",             // 8
    "OPEN_INTEREST",            // 9
    "VOLATILITY",               // 10
    "MONEY_INTRINSIC_VALUE",    // 11
    "EXPIRATION_YEAR",          // 12
    "MULTIPLIER",               // 13
    "DIGITS",                   // 14
    "OPEN_PRICE",               // 15
    "BID_SIZE",                 // 16
    "ASK_SIZE",                 // 17
    "LAST_SIZE",                // 18
    "NET_CHANGE",               // 19
    "STRIKE_PRICE",             // 20
    "CONTRACT_TYPE",            // 21
    "UNDERLYING",               // 22
    "EXPIRATION_MONTH",         // 23
    "DELIVERABLES",             // 24
    "TIME_VALUE",               // 25
    "EXPIRATION_DAY",           // 26
    "DAYS_TO_EXPIRATION",       // 27
    "DELTA",                    // 28
    "GAMMA",                    // 29
    "THETA",                    // 30
    "VEGA",                     // 31
    "RHO",                      // 32
    "SECURITY_STATUS",          // 33
    "THEORETICAL_OPTION_VALUE", // 34
    "UNDERLYING_PRICE",         // 35
    "UV_EXPIRATION_TYPE",       // 36
    "MARK",                     // 37
    "QUOTE_TIME_MILLIS",        // 38
    "TRADE_TIME_MILLIS",        // 39
    "EXCHANGE",                 // 40
    "EXCHANGE_NAME",            // 41
    "LAST_TRADING_DAY",         // 42
    "SETTLEMENT_TYPE",          // 43
    "NET_PERCENT_CHANGE",       // 44
    "MARK_CHANGE",              // 45
    "MARK_CHANGE_PERCENT",      // 46
    "IMPLIED_YIELD",            // 47
    "IS_PENNY",                 // 48
    "OPTION_ROOT",              // 49
    "HIGH_PRICE_52_WEEK",       // 50
    "LOW_PRICE_52_WEEK",        // 51
    "INDICATIVE_ASKING_PRICE",  // 52
    "INDICATIVE_BID_PRICE",     // 53
    "INDICATIVE_QUOTE_TIME",    // 54
    "EXERCISE_TYPE",            // 55
];

pub const LEVELONE_FUTURES: &[&str] = &[
    "SYMBOL",                  // 0
    "BID_PRICE",               // 1
    "ASK_PRICE",               // 2
    "LAST_PRICE",              // 3
    "BID_SIZE",                // 4
    "ASK_SIZE",                // 5
    "BID_ID",                  // 6
    "ASK_ID",                  // 7
    "TOTAL_VOLUME",            // 8
    "LAST_SIZE",               // 9
    "QUOTE_TIME_MILLIS",       // 10
    "TRADE_TIME_MILLIS",       // 11
    "HIGH_PRICE",              // 12
    "LOW_PRICE",               // 13
    "CLOSE_PRICE",             // 14
    "EXCHANGE_ID",             // 15
    "DESCRIPTION",             // 16
    "LAST_ID",                 // 17
    "OPEN_PRICE",              // 18
    "NET_CHANGE",              // 19
    "FUTURE_PERCENT_CHANGE",   // 20
    "EXCHANGE_NAME",           // 21
    "SECURITY_STATUS",         // 22
    "OPEN_INTEREST",           // 23
    "MARK",                    // 24
    "TICK",                    // 25
    "TICK_AMOUNT",             // 26
    "PRODUCT",                 // 27
    "FUTURE_PRICE_FORMAT",     // 28
    "FUTURE_TRADING_HOURS",    // 29
    "FUTURE_IS_TRADABLE",      // 30
    "FUTURE_MULTIPLIER",       // 31
    "FUTURE_IS_ACTIVE",        // 32
    "FUTURE_SETTLEMENT_PRICE", // 33
    "FUTURE_ACTIVE_SYMBOL",    // 34
    "FUTURE_EXPIRATION_DATE",  // 35
    "EXPIRATION_STYLE",        // 36
    "ASK_TIME_MILLIS",         // 37
    "BID_TIME_MILLIS",         // 38
    "QUOTED_IN_SESSION",       // 39
    "SETTLEMENT_DATE",         // 40
];

pub const LEVELONE_FUTURES_OPTIONS: &[&str] = &[
    "SYMBOL",                  // 0
    "BID_PRICE",               // 1
    "ASK_PRICE",               // 2
    "LAST_PRICE",              // 3
    "BID_SIZE",                // 4
    "ASK_SIZE",                // 5
    "BID_ID",                  // 6
    "ASK_ID",                  // 7
    "TOTAL_VOLUME",            // 8
    "LAST_SIZE",               // 9
    "QUOTE_TIME_MILLIS",       // 10
    "TRADE_TIME_MILLIS",       // 11
    "HIGH_PRICE",              // 12
    "LOW_PRICE",               // 13
    "CLOSE_PRICE",             // 14
    "LAST_ID",                 // 15
    "DESCRIPTION",             // 16
    "OPEN_PRICE",              // 17
    "OPEN_INTEREST",           // 18
    "MARK",                    // 19
    "TICK",                    // 20
    "TICK_AMOUNT",             // 21
    "FUTURE_MULTIPLIER",       // 22
    "FUTURE_SETTLEMENT_PRICE", // 23
    "UNDERLYING_SYMBOL",       // 24
    "STRIKE_PRICE",            // 25
    "FUTURE_EXPIRATION_DATE",  // 26
    "EXPIRATION_STYLE",        // 27
    "CONTRACT_TYPE",           // 28
    "SECURITY_STATUS",         // 29
    "EXCHANGE_ID",             // 30
    "EXCHANGE_NAME",           // 31
];

pub const LEVELONE_FOREX: &[&str] = &[
    "SYMBOL",             // 0
    "BID_PRICE",          // 1
    "ASK_PRICE",          // 2
    "LAST_PRICE",         // 3
    "BID_SIZE",           // 4
    "ASK_SIZE",           // 5
    "TOTAL_VOLUME",       // 6
    "LAST_SIZE",          // 7
    "QUOTE_TIME_MILLIS",  // 8
    "TRADE_TIME_MILLIS",  // 9
    "HIGH_PRICE",         // 10
    "LOW_PRICE",          // 11
    "CLOSE_PRICE",        // 12
    "EXCHANGE_ID",        // 13
    "DESCRIPTION",        // 14
    "OPEN_PRICE",         // 15
    "NET_CHANGE",         // 16
    "CHANGE_PERCENT",     // 17
    "EXCHANGE_NAME",      // 18
    "DIGITS",             // 19
    "SECURITY_STATUS",    // 20
    "TICK",               // 21
    "TICK_AMOUNT",        // 22
    "PRODUCT",            // 23
    "TRADING_HOURS",      // 24
    "IS_TRADABLE",        // 25
    "MARKET_MAKER",       // 26
    "HIGH_PRICE_52_WEEK", // 27
    "LOW_PRICE_52_WEEK",  // 28
    "MARK",               // 29
];

// ---------------------------------------------------------------------------
// Book, chart, screener, account activity
// ---------------------------------------------------------------------------

/// Shared by `NYSE_BOOK`, `NASDAQ_BOOK` and `OPTIONS_BOOK`.
pub const BOOK: &[&str] = &["SYMBOL", "BOOK_TIME", "BIDS", "ASKS"];

pub const CHART_EQUITY: &[&str] = &[
    "SYMBOL",            // 0
    "OPEN_PRICE",        // 1
    "HIGH_PRICE",        // 2
    "LOW_PRICE",         // 3
    "CLOSE_PRICE",       // 4
    "VOLUME",            // 5
    "SEQUENCE",          // 6
    "CHART_TIME_MILLIS", // 7
    "CHART_DAY",         // 8
];

pub const CHART_FUTURES: &[&str] = &[
    "SYMBOL",            // 0
    "CHART_TIME_MILLIS", // 1
    "OPEN_PRICE",        // 2
    "HIGH_PRICE",        // 3
    "LOW_PRICE",         // 4
    "CLOSE_PRICE",       // 5
    "VOLUME",            // 6
];

/// Shared by `SCREENER_EQUITY` and `SCREENER_OPTION`.
pub const SCREENER: &[&str] = &["SYMBOL", "TIMESTAMP", "SORT_FIELD", "FREQUENCY", "ITEMS"];

pub const ACCT_ACTIVITY: &[&str] = &["SUBSCRIPTION_KEY", "ACCOUNT", "MESSAGE_TYPE", "MESSAGE_DATA"];

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

/// The schema for a service, or `None` for services without positional data.
pub fn schema(service: Service) -> Option<&'static [&'static str]> {
    match service {
        Service::ADMIN => None,
        Service::LEVELONE_EQUITIES => Some(LEVELONE_EQUITIES),
        Service::LEVELONE_OPTIONS => Some(LEVELONE_OPTIONS),
        Service::LEVELONE_FUTURES => Some(LEVELONE_FUTURES),
        Service::LEVELONE_FUTURES_OPTIONS => Some(LEVELONE_FUTURES_OPTIONS),
        Service::LEVELONE_FOREX => Some(LEVELONE_FOREX),
        Service::NYSE_BOOK | Service::NASDAQ_BOOK | Service::OPTIONS_BOOK => Some(BOOK),
        Service::CHART_EQUITY => Some(CHART_EQUITY),
        Service::CHART_FUTURES => Some(CHART_FUTURES),
        Service::SCREENER_EQUITY | Service::SCREENER_OPTION => Some(SCREENER),
        Service::ACCT_ACTIVITY => Some(ACCT_ACTIVITY),
    }
}

/// Schema lookup by wire name. Unknown services have no schema.
pub fn schema_for(service: &str) -> Option<&'static [&'static str]> {
    service.parse::<Service>().ok().and_then(schema)
}

/// Name of wire key `index` for `service`.
pub fn field_name(service: &str, index: usize) -> Option<&'static str> {
    schema_for(service).and_then(|s| s.get(index).copied())
}

/// Wire key for a field name, the inverse of [`field_name`].
pub fn field_index(service: Service, name: &str) -> Option<u32> {
    schema(service)?
        .iter()
        .position(|n| *n == name)
        .and_then(|i| u32::try_from(i).ok())
}

/// Field ids requested when the caller does not pick any.
pub fn default_fields(service: Service) -> &'static [u32] {
    match service {
        Service::ADMIN => &[],
        Service::LEVELONE_EQUITIES => &[
            0, 1, 2, 3, 4, 5, 8, 10, 11, 12, 15, 17, 18, 25, 29, 32, 33, 42,
        ],
        Service::LEVELONE_OPTIONS => &[
            0, 2, 3, 4, 8, 9, 10, 12, 19, 20, 21, 22, 23, 26, 27, 28, 29, 30, 31, 32, 35, 37,
        ],
        Service::LEVELONE_FUTURES => &[
            0, 1, 2, 3, 4, 5, 8, 10, 11, 12, 13, 14, 18, 19, 20, 23, 24, 25, 26,
        ],
        Service::LEVELONE_FUTURES_OPTIONS => &[
            0, 1, 2, 3, 4, 5, 8, 10, 11, 12, 13, 14, 17, 18, 19, 25, 28,
        ],
        Service::LEVELONE_FOREX => &[0, 1, 2, 3, 4, 5, 6, 8, 10, 11, 12, 15, 16, 17, 29],
        Service::NYSE_BOOK | Service::NASDAQ_BOOK | Service::OPTIONS_BOOK => &[0, 1, 2, 3],
        Service::CHART_EQUITY => &[0, 1, 2, 3, 4, 5, 6, 7, 8],
        Service::CHART_FUTURES => &[0, 1, 2, 3, 4, 5, 6],
        Service::SCREENER_EQUITY | Service::SCREENER_OPTION => &[0, 1, 2, 3, 4],
        Service::ACCT_ACTIVITY => &[0, 1, 2, 3],
    }
}

/// Join field ids the way the wire expects them: `"0,1,2"`.
pub fn join_fields(fields: &[u32]) -> String {
    fields
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_one_equities_leading_fields() {
        assert_eq!(field_name("LEVELONE_EQUITIES", 0), Some("SYMBOL"));
        assert_eq!(field_name("LEVELONE_EQUITIES", 1), Some("BID_PRICE"));
        assert_eq!(field_name("LEVELONE_EQUITIES", 2), Some("ASK_PRICE"));
        assert_eq!(field_name("LEVELONE_EQUITIES", 42), Some("NET_CHANGE_PERCENT"));
        assert_eq!(field_name("LEVELONE_EQUITIES", 52), None);
    }

    #[test]
    fn shared_schemas() {
        assert_eq!(schema(Service::NYSE_BOOK), schema(Service::OPTIONS_BOOK));
        assert_eq!(schema(Service::NASDAQ_BOOK), Some(BOOK));
        assert_eq!(schema(Service::SCREENER_OPTION), schema(Service::SCREENER_EQUITY));
        assert_eq!(schema(Service::ADMIN), None);
        assert_eq!(schema_for("NOT_A_SERVICE"), None);
    }

    #[test]
    fn field_index_inverts_field_name() {
        for service in Service::ALL {
            let Some(names) = schema(service) else { continue };
            for (i, name) in names.iter().enumerate() {
                assert_eq!(field_index(service, name), Some(i as u32), "{service} {name}");
            }
        }
    }

    #[test]
    fn schemas_have_unique_names() {
        for service in Service::ALL {
            let Some(names) = schema(service) else { continue };
            let mut sorted = names.to_vec();
            sorted.sort_unstable();
            sorted.dedup();
            assert_eq!(sorted.len(), names.len(), "duplicate field in {service}");
        }
    }

    #[test]
    fn default_fields_exist_in_schema() {
        for service in Service::ALL {
            let len = schema(service).map_or(0, <[_]>::len);
            for f in default_fields(service) {
                assert!((*f as usize) < len, "{service} default field {f} out of range");
            }
        }
    }

    #[test]
    fn equities_default_list_on_the_wire() {
        assert_eq!(
            join_fields(default_fields(Service::LEVELONE_EQUITIES)),
            "0,1,2,3,4,5,8,10,11,12,15,17,18,25,29,32,33,42"
        );
    }
}
