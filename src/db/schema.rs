diesel::table! {
    guild_config (id) {
        id -> BigInt,
        prefix -> Nullable<Text>,
        autorole -> Nullable<BigInt>,
        welcomemessage -> Nullable<Text>,
        welcomeenabled -> Bool,
        welcomeid -> Nullable<BigInt>,
        log_id -> Nullable<BigInt>,
    }
}

diesel::table! {
    blacklist (id) {
        id -> BigInt,
    }
}

diesel::table! {
    reaction_roles (msg_id) {
        msg_id -> BigInt,
        role_id -> BigInt,
    }
}

diesel::allow_tables_to_appear_in_same_query!(guild_config, blacklist, reaction_roles,);
