pub mod shared {
    pub mod core {
        pub mod primitives;
    }
    pub mod infrastructure {
        pub mod blob_store;
    }
}

pub mod modules {
    pub mod checkpoints {
        pub mod core {
            pub mod watermark;
        }
        pub mod adapters {
            pub mod outbound {
                pub mod checkpoint_store;
            }
        }
        pub mod use_cases {
            pub mod run_etl {
                pub mod command;
                pub mod handler;
                pub mod inbound {
                    pub mod graphql;
                    pub mod http;
                }
            }
            pub mod read_watermark {
                pub mod inbound {
                    pub mod graphql;
                }
            }
        }
    }
    pub mod greetings {
        pub mod use_cases {
            pub mod greet {
                pub mod greeting;
                pub mod inbound {
                    pub mod http;
                }
            }
        }
    }
}

pub mod shell;
