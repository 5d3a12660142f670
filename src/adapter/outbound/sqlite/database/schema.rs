// Diesel schema for the cumulative flow table.

diesel::table! {
    cumulative (market_id, selection_id) {
        market_id -> Text,
        selection_id -> Text,
        team_label -> Text,
        in_back -> Double,
        in_lay -> Double,
        out_back -> Double,
        out_lay -> Double,
        last_back_stake -> Double,
        last_lay_stake -> Double,
        updated_at -> Text,
    }
}
