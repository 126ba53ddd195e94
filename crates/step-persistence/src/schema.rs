// Esquema Diesel del medio de borradores (SQLite).
// Tablas: drafts
diesel::table! {
    drafts (draft_key) {
        draft_key -> Text,
        payload -> Text,
        updated_at_ts -> BigInt,
    }
}
