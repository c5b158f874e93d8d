pub mod app;

pub mod common {
    pub mod config;
    pub mod error;
    pub mod event;
    pub mod logging;
    pub mod money;
}

pub mod domain {
    pub mod account;
    pub mod ledger;
    pub mod store;
    pub mod transaction;
    pub mod user;
}

pub mod io {
    pub mod reader;
    pub mod validation;
    pub mod writer;
}

pub mod worker {
    pub mod lock;
    pub mod processor;

    pub mod handlers {
        pub mod cancel_balance;
        pub mod failed;
        pub mod query;
        pub mod use_balance;
    }
}
