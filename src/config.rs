use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,

    pub dispatch_interval_seconds: u64,
    pub dispatch_timeout_seconds: u64,
    pub dispatch_max_concurrency: usize,
    pub retry_backoff_seconds: i64,

    pub hmac_shared_secret: Vec<u8>,
    pub hmac_clock_skew_seconds: i64,

    pub jwt_secret: String,
    pub jwt_ttl_seconds: i64,

    pub executor_private_key: String,
    pub executor_url: String,
    pub rpc_url: String,
    pub chain_id: u64,
    pub recurring_contract: String,
    pub usdc_address: String,

    pub parser_url: String,
    pub parser_timeout_seconds: u64,
    pub shard_op_timeout_seconds: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenv::dotenv().ok();

        let database_url = env::var("DATABASE_URL")?;

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env
            ::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()?;

        let dispatch_interval_seconds = env
            ::var("DISPATCH_INTERVAL_SECONDS")
            .unwrap_or_else(|_| "60".to_string())
            .parse()?;
        let dispatch_timeout_seconds = env
            ::var("DISPATCH_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()?;
        let dispatch_max_concurrency = env
            ::var("DISPATCH_MAX_CONCURRENCY")
            .unwrap_or_else(|_| "8".to_string())
            .parse()?;
        let retry_backoff_seconds = env
            ::var("RETRY_BACKOFF_SECONDS")
            .unwrap_or_else(|_| "600".to_string())
            .parse()?;

        let hmac_shared_secret = env::var("HMAC_SHARED_SECRET")?.into_bytes();
        if hmac_shared_secret.len() < 32 {
            return Err("HMAC_SHARED_SECRET must be at least 32 bytes".into());
        }
        let hmac_clock_skew_seconds = env
            ::var("HMAC_CLOCK_SKEW_SECONDS")
            .unwrap_or_else(|_| "300".to_string())
            .parse()?;

        let jwt_secret = env::var("JWT_SECRET")?;
        if jwt_secret.len() < 32 {
            return Err("JWT_SECRET must be at least 32 bytes".into());
        }
        let jwt_ttl_seconds = env
            ::var("JWT_TTL_SECONDS")
            .unwrap_or_else(|_| "86400".to_string())
            .parse()?;

        let executor_private_key = env::var("EXECUTOR_PRIVATE_KEY")?;
        let executor_url = env::var("EXECUTOR_URL")?;
        let rpc_url = env::var("RPC_URL")?;
        let chain_id = env
            ::var("CHAIN_ID")
            .unwrap_or_else(|_| "8453".to_string())
            .parse()?;
        let recurring_contract = env::var("RECURRING_CONTRACT")?;
        let usdc_address = env::var("USDC_ADDRESS")?;

        let parser_url = env::var("PARSER_URL")?;
        let parser_timeout_seconds = env
            ::var("PARSER_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "15".to_string())
            .parse()?;
        let shard_op_timeout_seconds = env
            ::var("SHARD_OP_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()?;

        Ok(Config {
            database_url,
            server_host,
            server_port,
            dispatch_interval_seconds,
            dispatch_timeout_seconds,
            dispatch_max_concurrency,
            retry_backoff_seconds,
            hmac_shared_secret,
            hmac_clock_skew_seconds,
            jwt_secret,
            jwt_ttl_seconds,
            executor_private_key,
            executor_url,
            rpc_url,
            chain_id,
            recurring_contract,
            usdc_address,
            parser_url,
            parser_timeout_seconds,
            shard_op_timeout_seconds,
        })
    }
}
