//! Column names of the listings and country lookup tables.

pub const RESTAURANT_ID: &str = "Restaurant ID";
pub const RESTAURANT_NAME: &str = "Restaurant Name";
pub const COUNTRY_CODE: &str = "Country Code";
pub const CITY: &str = "City";
pub const ADDRESS: &str = "Address";
pub const LOCALITY: &str = "Locality";
pub const LOCALITY_VERBOSE: &str = "Locality Verbose";
pub const LONGITUDE: &str = "Longitude";
pub const LATITUDE: &str = "Latitude";
pub const CUISINES: &str = "Cuisines";
pub const AVERAGE_COST_FOR_TWO: &str = "Average Cost for two";
pub const CURRENCY: &str = "Currency";
pub const HAS_TABLE_BOOKING: &str = "Has Table booking";
pub const HAS_ONLINE_DELIVERY: &str = "Has Online delivery";
pub const IS_DELIVERING_NOW: &str = "Is delivering now";
pub const SWITCH_TO_ORDER_MENU: &str = "Switch to order menu";
pub const PRICE_RANGE: &str = "Price range";
pub const AGGREGATE_RATING: &str = "Aggregate rating";
pub const RATING_COLOR: &str = "Rating color";
pub const RATING_TEXT: &str = "Rating text";
pub const VOTES: &str = "Votes";

/// Resolved country name, contributed by the lookup table.
pub const COUNTRY: &str = "Country";

/// Header of the listings file, in file order.
pub const LISTING_COLUMNS: [&str; 21] = [
    RESTAURANT_ID,
    RESTAURANT_NAME,
    COUNTRY_CODE,
    CITY,
    ADDRESS,
    LOCALITY,
    LOCALITY_VERBOSE,
    LONGITUDE,
    LATITUDE,
    CUISINES,
    AVERAGE_COST_FOR_TWO,
    CURRENCY,
    HAS_TABLE_BOOKING,
    HAS_ONLINE_DELIVERY,
    IS_DELIVERING_NOW,
    SWITCH_TO_ORDER_MENU,
    PRICE_RANGE,
    AGGREGATE_RATING,
    RATING_COLOR,
    RATING_TEXT,
    VOTES,
];

/// Numeric columns the report describes and correlates.
pub const KEY_NUMERIC_COLUMNS: [&str; 4] =
    [AVERAGE_COST_FOR_TWO, PRICE_RANGE, AGGREGATE_RATING, VOTES];

/// Yes/No service flags.
pub const SERVICE_FLAGS: [&str; 4] = [
    HAS_TABLE_BOOKING,
    HAS_ONLINE_DELIVERY,
    IS_DELIVERING_NOW,
    SWITCH_TO_ORDER_MENU,
];
