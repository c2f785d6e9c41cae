//! Integration tests for full sessions
//!
//! Each test stands up a wiremock server playing the target site and runs a
//! session against it with a small set of test identities.

use crawlerview::config::{Config, FetchConfig, IdentityEntry, RobotsConfig};
use crawlerview::crawler::{Fetcher, IdentityOutcome, Session};
use crawlerview::explain::ScoreRange;
use crawlerview::robots::RobotsProber;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const COMPLETE_PAGE: &str = r#"<html>
<head>
  <title>Field Guide</title>
  <meta name="description" content="A field guide to local birds">
  <script type="application/ld+json">{"@type": "Article"}</script>
</head>
<body>
  <h1>Local Birds</h1>
  <p>Herons, egrets and kingfishers are common along the river in spring.
  Look for herons standing still in the shallows at dawn, egrets gathering in
  the reed beds, and kingfishers perched on low branches over slow water.
  Most species can be seen from the main footpath without disturbing them.</p>
  <noscript>This guide works without JavaScript. All species lists, range maps and seasonal calendars are available as plain HTML pages.</noscript>
</body>
</html>"#;

fn identity(name: &str) -> IdentityEntry {
    IdentityEntry {
        name: name.to_string(),
        user_agent: format!("{}/1.0", name),
    }
}

fn test_config(names: &[&str]) -> Config {
    Config {
        fetch: FetchConfig {
            timeout_secs: 5,
            max_redirects: 5,
            max_retries: 3,
            backoff_base_ms: 10,
        },
        robots: RobotsConfig {
            identity: names[0].to_string(),
            blocked_agents: vec!["GPTBot".to_string(), "Claude-Web".to_string()],
        },
        identities: names.iter().map(|n| identity(n)).collect(),
    }
}

fn loading_page() -> String {
    COMPLETE_PAGE.replace("<h1>", r#"<div class="spinner"></div><h1>"#)
}

#[tokio::test]
async fn test_session_averages_analyzed_identities_only() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page"))
        .and(header("user-agent", "AlphaBot/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(COMPLETE_PAGE))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page"))
        .and(header("user-agent", "BetaBot/1.0"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page"))
        .and(header("user-agent", "GammaBot/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(loading_page()))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page"))
        .and(header("user-agent", "DeltaBot/1.0"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let config = test_config(&["AlphaBot", "BetaBot", "GammaBot", "DeltaBot"]);
    let session = Session::new(&config).unwrap();
    let result = session
        .run(&format!("{}/page", mock_server.uri()))
        .await
        .expect("session completes");

    // Registration order is preserved
    let names: Vec<&str> = result.crawlers.iter().map(|c| c.name()).collect();
    assert_eq!(names, vec!["AlphaBot", "BetaBot", "GammaBot", "DeltaBot"]);

    assert_eq!(result.crawlers[0].score(), 100);
    assert_eq!(result.crawlers[2].score(), 85);
    assert!(result.crawlers[1].is_error());
    assert!(result.crawlers[3].is_error());

    match &result.crawlers[1] {
        IdentityOutcome::Failed(failed) => {
            assert_eq!(failed.error, "HTTP 403");
            assert_eq!(failed.status, Some(403));
            assert!(failed.explanation.contains("blocking"));
            assert_eq!(failed.retry_attempts.len(), 1);
        }
        other => panic!("expected a failed outcome, got {:?}", other),
    }

    assert_eq!(result.average_score, 92.5);
    assert_eq!(result.analyzed_count(), 2);
    assert_eq!(result.verdict, ScoreRange::Excellent);

    assert!(result.robots_txt.accessible);
    assert_eq!(
        result.robots_txt.issues,
        vec!["All bots may be blocked (User-agent: * with Disallow)".to_string()]
    );
}

#[tokio::test]
async fn test_session_records_redirect_chain() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(ResponseTemplate::new(200).set_body_string(COMPLETE_PAGE))
        .mount(&mock_server)
        .await;

    let config = test_config(&["AlphaBot"]);
    let result = Session::new(&config)
        .unwrap()
        .run(&format!("{}/old", mock_server.uri()))
        .await
        .unwrap();

    match &result.crawlers[0] {
        IdentityOutcome::Analyzed(analyzed) => {
            assert_eq!(analyzed.final_url, format!("{}/new", mock_server.uri()));
            assert_eq!(analyzed.redirect_chain.len(), 1);
            assert_eq!(analyzed.redirect_chain[0].status, 301);
            assert_eq!(analyzed.analysis.score, 100);
        }
        other => panic!("expected an analyzed outcome, got {:?}", other),
    }

    // No robots.txt mock: wiremock answers 404
    assert!(!result.robots_txt.accessible);
    assert_eq!(
        result.robots_txt.error.as_deref(),
        Some("robots.txt returned status 404")
    );
}

#[tokio::test]
async fn test_session_reports_progress_in_order() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(COMPLETE_PAGE))
        .mount(&mock_server)
        .await;

    let config = test_config(&["AlphaBot", "BetaBot", "GammaBot"]);
    let session = Session::new(&config).unwrap();

    let mut seen = Vec::new();
    let result = session
        .run_with_progress(&format!("{}/", mock_server.uri()), |index, outcome| {
            seen.push((index, outcome.name().to_string()));
        })
        .await
        .unwrap();

    assert_eq!(
        seen,
        vec![
            (0, "AlphaBot".to_string()),
            (1, "BetaBot".to_string()),
            (2, "GammaBot".to_string()),
        ]
    );
    assert_eq!(result.crawlers.len(), 3);
}

#[tokio::test]
async fn test_unreachable_site_fails_every_identity() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let config = test_config(&["AlphaBot", "BetaBot"]);
    let result = Session::new(&config)
        .unwrap()
        .run(&format!("http://127.0.0.1:{}/", port))
        .await
        .expect("failures are reported, not raised");

    assert!(!result.robots_txt.accessible);
    assert!(result.robots_txt.error.is_some());

    assert!(result.crawlers.iter().all(|c| c.is_error()));
    assert!(result.crawlers.iter().all(|c| c.retry_attempts().len() == 3));
    assert_eq!(result.average_score, 0.0);
    assert_eq!(result.verdict, ScoreRange::Poor);

    match &result.crawlers[0] {
        IdentityOutcome::Failed(failed) => {
            assert_eq!(failed.status, None);
            assert!(!failed.explanation.is_empty());
        }
        other => panic!("expected a failed outcome, got {:?}", other),
    }
}

#[tokio::test]
async fn test_cancelled_session_skips_identities() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(COMPLETE_PAGE))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = test_config(&["AlphaBot", "BetaBot"]);
    let session = Session::new(&config).unwrap();
    session.cancellation_token().cancel();

    let result = session
        .run(&format!("{}/", mock_server.uri()))
        .await
        .unwrap();

    assert!(result.crawlers.iter().all(|c| c.is_error()));
    assert!(result.crawlers.iter().all(|c| c.retry_attempts().is_empty()));
    assert_eq!(result.average_score, 0.0);
}

#[tokio::test]
async fn test_cancellation_ends_with_the_run() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(COMPLETE_PAGE))
        .expect(2)
        .mount(&mock_server)
        .await;

    let config = test_config(&["AlphaBot", "BetaBot"]);
    let session = Session::new(&config).unwrap();
    let url = format!("{}/", mock_server.uri());

    session.cancellation_token().cancel();
    let cancelled = session.run(&url).await.unwrap();
    assert!(cancelled.crawlers.iter().all(|c| c.is_error()));

    let next = session.run(&url).await.unwrap();
    assert!(next.crawlers.iter().all(|c| !c.is_error()));
    assert_eq!(next.average_score, 100.0);
}

#[tokio::test]
async fn test_cancelling_one_clone_leaves_others_running() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(COMPLETE_PAGE))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = test_config(&["AlphaBot"]);
    let session = Session::new(&config).unwrap();
    let other = session.clone();
    session.cancellation_token().cancel();

    let result = other
        .run(&format!("{}/", mock_server.uri()))
        .await
        .unwrap();
    assert_eq!(result.analyzed_count(), 1);
}

#[tokio::test]
async fn test_session_result_json_shape() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(COMPLETE_PAGE))
        .mount(&mock_server)
        .await;

    let config = test_config(&["AlphaBot"]);
    let result = Session::new(&config)
        .unwrap()
        .run(&format!("{}/", mock_server.uri()))
        .await
        .unwrap();

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["averageScore"], 100.0);
    assert_eq!(json["robotsTxt"]["accessible"], false);
    assert_eq!(json["crawlers"][0]["outcome"], "analyzed");
    assert_eq!(json["crawlers"][0]["name"], "AlphaBot");
    assert_eq!(json["crawlers"][0]["score"], 100);
    assert_eq!(json["crawlers"][0]["hasContent"], true);
    assert!(json["crawlers"][0]["retryAttempts"].is_array());
}

#[tokio::test]
async fn test_robots_probe_flags_named_agents() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .and(header("user-agent", "ProbeBot/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "User-agent: GPTBot\nDisallow: /\n\nUser-agent: Claude-Web\nDisallow: /private\n",
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = Fetcher::new(&FetchConfig::default()).unwrap();
    let prober = RobotsProber::new(fetcher, "ProbeBot/1.0", &RobotsConfig::default());
    let result = prober
        .probe(&format!("{}/deep/page?x=1", mock_server.uri()))
        .await;

    assert!(result.accessible);
    assert!(result.content.is_some());
    assert_eq!(
        result.issues,
        vec![
            "GPTBot is blocked in robots.txt".to_string(),
            "Claude-Web is blocked in robots.txt".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_robots_probe_clean_file() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nAllow: /\n"))
        .mount(&mock_server)
        .await;

    let fetcher = Fetcher::new(&FetchConfig::default()).unwrap();
    let prober = RobotsProber::new(fetcher, "ProbeBot/1.0", &RobotsConfig::default());
    let result = prober.probe(&mock_server.uri()).await;

    assert!(result.accessible);
    assert!(result.issues.is_empty());
    assert_eq!(result.error, None);
}
