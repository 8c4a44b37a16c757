//! End-to-end poll cycles against local HTTP servers serving canned
//! WeatherLink Live / AirLink responses.

use davis_www::app::{Options, run_with_io};
use davis_www::output::Format;
use davis_www::{FetchError, Fetcher, HttpFetcher, Station, StationConfig};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const WLL_BODY: &str = r#"{"data": {"did": "001D0A700002", "ts": 1531754005, "conditions": [
    {"lsid": 48308, "data_structure_type": 1, "txid": 1, "temp": 62.7, "hum": 1.1,
     "wind_speed_avg_last_1_min": 0.0, "wind_dir_scalar_avg_last_1_min": null,
     "rainfall_monthly": 63, "rain_rate_last": 0},
    {"lsid": 48309, "data_structure_type": 2, "txid": 3, "temp_1": 58.2, "moist_soil_1": 12},
    {"lsid": 48306, "data_structure_type": 3, "bar_sea_level": 30.008, "bar_absolute": 29.988},
    {"lsid": 48307, "data_structure_type": 4, "temp_in": 78.0, "hum_in": 41.1, "dew_point_in": 7.8}
]}, "error": null}"#;

const AIRLINK_BODY: &str = r#"{"data": {"did": "001D0A100021", "ts": 1531754000, "conditions": [
    {"lsid": 3, "data_structure_type": 6, "temp": 60.1, "hum": 30.0,
     "pm_1": 2.0, "pm_2p5": 3.5, "pm_10": 5.25}
]}, "error": null}"#;

/// Serve `body` with `status` to every connection; returns the bound address.
async fn serve(status: &'static str, body: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// An address nothing is listening on.
async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

fn fetcher() -> HttpFetcher {
    HttpFetcher::new(Duration::from_secs(2)).unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn merges_weather_and_air_quality_hosts() {
    let wll = serve("200 OK", WLL_BODY).await;
    let airlink = serve("200 OK", AIRLINK_BODY).await;

    let settings = StationConfig {
        weather_host: Some(wll.to_string()),
        aqi_host: Some(airlink.to_string()),
        ..StationConfig::default()
    }
    .validate()
    .unwrap();
    let fetcher = fetcher();
    let mut station = Station::new(&settings, &fetcher);

    let obs = station.poll().await.unwrap();

    assert_eq!(obs.number("outTemp"), Some(62.7));
    assert_eq!(obs.number("soilTemp1"), Some(58.2));
    assert_eq!(obs.number("soilMoist1"), Some(12.0));
    assert_eq!(obs.number("barometer"), Some(30.008));
    assert_eq!(obs.number("pressure"), Some(29.988));
    assert_eq!(obs.number("inHumidity"), Some(41.1));
    assert_eq!(obs.number("pm2_5"), Some(3.5));
    assert_eq!(obs.number("pm10_0"), Some(5.25));
    assert_eq!(obs.number("rain"), Some(0.0));
    assert!(obs.get("windDir").is_none());
    assert_eq!(obs.unix_seconds(), 1531754005);
}

#[tokio::test(flavor = "multi_thread")]
async fn one_reachable_host_is_enough() {
    let airlink = serve("200 OK", AIRLINK_BODY).await;
    let dead = closed_port().await;

    let settings = StationConfig {
        weather_host: Some(dead.to_string()),
        aqi_host: Some(airlink.to_string()),
        ..StationConfig::default()
    }
    .validate()
    .unwrap();
    let fetcher = fetcher();
    let mut station = Station::new(&settings, &fetcher);

    let obs = station.poll().await.unwrap();
    assert_eq!(obs.number("pm1_0"), Some(2.0));
    // only the AirLink reports temperature, so the ordering falls through to it
    assert_eq!(obs.number("outTemp"), Some(60.1));
    assert_eq!(obs.unix_seconds(), 1531754000);
}

#[tokio::test(flavor = "multi_thread")]
async fn no_reachable_host_is_a_transient_error() {
    let dead = closed_port().await;
    let busy = serve("503 Service Unavailable", "{}").await;

    let settings = StationConfig {
        weather_host: Some(dead.to_string()),
        aqi_host: Some(busy.to_string()),
        ..StationConfig::default()
    }
    .validate()
    .unwrap();
    let fetcher = fetcher();
    let mut station = Station::new(&settings, &fetcher);

    let err = station.poll().await.unwrap_err();
    assert_eq!(err.failures.len(), 2);
    assert!(matches!(err.failures[0].error, FetchError::Status(503)));
    assert!(matches!(err.failures[1].error, FetchError::Http(_)));
}

#[tokio::test(flavor = "multi_thread")]
async fn http_fetcher_returns_body() {
    let wll = serve("200 OK", WLL_BODY).await;
    let url = davis_www::fetch::current_conditions_url(&wll.to_string());

    let body = fetcher().fetch(&url).await.unwrap();
    assert_eq!(body, WLL_BODY);
}

#[tokio::test(flavor = "multi_thread")]
async fn run_loop_prints_line_protocol() {
    let wll = serve("200 OK", WLL_BODY).await;

    let options = Options {
        config: None,
        weather_host: Some(wll.to_string()),
        aqi_host: None,
        poll_interval: None,
        mappings: vec![],
        format: Format::Influxdb,
        influxdb_measurement: "weather".to_string(),
        count: Some(1),
        verbose: false,
    };
    let settings = options.load_settings().unwrap();
    let fetcher = HttpFetcher::new(settings.timeout).unwrap();

    let mut out = Vec::<u8>::new();
    let summary = run_with_io(&options, &settings, &fetcher, &mut out)
        .await
        .unwrap();

    assert_eq!(summary.emitted, 1);
    let out = String::from_utf8(out).unwrap();
    assert!(out.starts_with("weather,station=DavisWWW "));
    assert!(out.contains("outTemp=62.7"));
    assert!(out.trim_end().ends_with("1531754005000000000"));
}
