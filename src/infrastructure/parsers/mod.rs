pub mod billing_parser;
