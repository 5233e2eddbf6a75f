//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the postback grid and drive the
//! HTTP navigator, then the full crawl and scrape cycle, against it.

use std::sync::Arc;
use suger::config::Config;
use suger::crawler::{
    crawl, Coordinator, HttpNavigator, HttpNavigatorFactory, Navigator, Range, RetrievedPage,
    Session,
};
use suger::output::write_titles_json;
use suger::scrape::scrape_dir;
use suger::{NavState, ProtocolError, SugerError};
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Renders a grid form carrying the given view state
fn form_page(viewstate: &str) -> String {
    format!(
        r#"<html><body><form id="form1" method="post" action="./Default.aspx">
        <input type="hidden" name="__VIEWSTATE" id="__VIEWSTATE" value="{vs}" />
        <input type="hidden" name="__VIEWSTATEGENERATOR" id="__VIEWSTATEGENERATOR" value="gen-{vs}" />
        <input type="hidden" name="__EVENTVALIDATION" id="__EVENTVALIDATION" value="ev-{vs}" />
        <table id="gvResult"></table>
        </form></body></html>"#,
        vs = viewstate
    )
}

/// Renders a detail page for record `id`
fn detail_page(id: u32) -> String {
    format!(
        r#"<html><body><form id="form1" method="post" action="Details.aspx?id={id}">
        <span id="lblTitle">Record {id}</span>
        <div id="content"><table>
          <tr><td><img src="r.gif" alt="General Viewing"></td><td>Passed Clean</td></tr>
        </table></div>
        </form></body></html>"#,
        id = id
    )
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html; charset=utf-8")
}

/// Mounts the landing form and the search redirect to `/grid/results.aspx`
async fn mount_landing_and_search(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/grid/"))
        .respond_with(
            html(form_page("landing")).insert_header("set-cookie", "ASP.NET_SessionId=abc; Path=/"),
        )
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/grid/"))
        .and(body_string_contains("__VIEWSTATE=landing"))
        .and(body_string_contains("btnSearch=Search"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/grid/results.aspx"))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/grid/results.aspx"))
        .respond_with(html(form_page("search")))
        .mount(server)
        .await;
}

fn test_config(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.site.base_url = format!("{}/grid/", server.uri());
    config.crawler.backoff_secs = 0;
    config.crawler.max_retries = Some(1);
    config.crawler.request_timeout_secs = 5;
    config.crawler.connect_timeout_secs = 5;
    config
}

fn navigator(server: &MockServer) -> HttpNavigator {
    HttpNavigator::new(Session::new(&test_config(server)).unwrap())
}

#[tokio::test]
async fn test_navigator_round_trips_tokens_and_cookies() {
    let server = MockServer::start().await;
    mount_landing_and_search(&server).await;

    Mock::given(method("POST"))
        .and(path("/grid/results.aspx"))
        .and(header("cookie", "ASP.NET_SessionId=abc"))
        .and(body_string_contains("__VIEWSTATE=search"))
        .and(body_string_contains("__EVENTTARGET=gvResult"))
        .and(body_string_contains("__EVENTARGUMENT=Page%242"))
        .respond_with(html(form_page("page2")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/grid/results.aspx"))
        .and(body_string_contains("__VIEWSTATE=page2"))
        .and(body_string_contains("__EVENTARGUMENT=Title%243"))
        .respond_with(html(detail_page(23)))
        .expect(1)
        .mount(&server)
        .await;

    let mut nav = navigator(&server);
    nav.initialize().await.unwrap();
    assert_eq!(nav.state(), NavState::Initialized);
    assert_eq!(nav.session().tokens().get("__VIEWSTATE"), Some("landing"));

    nav.submit_search().await.unwrap();
    assert_eq!(nav.session().form_url().path(), "/grid/results.aspx");
    assert_eq!(nav.session().tokens().get("__EVENTVALIDATION"), Some("ev-search"));

    nav.advance_to_page(2).await.unwrap();
    assert_eq!(nav.state(), NavState::PageActive { page: 2 });

    let row = nav.open_row(3).await.unwrap();
    assert!(row.url.ends_with("/grid/results.aspx"));
    assert!(String::from_utf8_lossy(&row.body).contains("Record 23"));

    // Opening a row leaves the grid's tokens in place for its siblings
    assert_eq!(nav.session().tokens().get("__VIEWSTATE"), Some("page2"));
}

#[tokio::test]
async fn test_redirect_during_paging_is_a_desync() {
    let server = MockServer::start().await;
    mount_landing_and_search(&server).await;

    Mock::given(method("POST"))
        .and(path("/grid/results.aspx"))
        .and(body_string_contains("Page%242"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/grid/Expired.aspx"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/grid/Expired.aspx"))
        .respond_with(html(form_page("expired")))
        .mount(&server)
        .await;

    let mut nav = navigator(&server);
    nav.initialize().await.unwrap();
    nav.submit_search().await.unwrap();

    let err = nav.advance_to_page(2).await.unwrap_err();
    match err {
        SugerError::Protocol(ProtocolError::PostbackTargetChanged { expected, actual }) => {
            assert!(expected.ends_with("/grid/results.aspx"));
            assert!(actual.ends_with("/grid/Expired.aspx"));
        }
        other => panic!("expected PostbackTargetChanged, got {:?}", other),
    }
    assert_eq!(nav.state(), NavState::SearchSubmitted);
}

#[tokio::test]
async fn test_missing_tokens_fail_initialize() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/grid/"))
        .respond_with(html("<html><body>Service Unavailable</body></html>".to_string()))
        .mount(&server)
        .await;

    let mut nav = navigator(&server);
    let err = nav.initialize().await.unwrap_err();

    assert!(matches!(
        err,
        SugerError::Protocol(ProtocolError::MissingToken {
            name: "__VIEWSTATE",
            ..
        })
    ));
    assert!(err.is_retryable());
    assert_eq!(nav.state(), NavState::Uninitialized);
}

#[tokio::test]
async fn test_server_error_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/grid/"))
        .respond_with(html(form_page("landing")))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/grid/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut nav = navigator(&server);
    nav.initialize().await.unwrap();
    let err = nav.submit_search().await.unwrap_err();

    assert!(matches!(
        err,
        SugerError::Protocol(ProtocolError::UnexpectedStatus { status: 500, .. })
    ));
}

#[tokio::test]
async fn test_page_outside_window_is_rejected_locally() {
    let server = MockServer::start().await;
    mount_landing_and_search(&server).await;

    Mock::given(method("POST"))
        .and(path("/grid/results.aspx"))
        .respond_with(html(form_page("never")))
        .expect(0)
        .mount(&server)
        .await;

    let mut nav = navigator(&server);
    nav.initialize().await.unwrap();
    nav.submit_search().await.unwrap();

    let err = nav.advance_to_page(25).await.unwrap_err();
    assert!(matches!(
        err,
        SugerError::Protocol(ProtocolError::PageOutOfWindow {
            current: 1,
            target: 25
        })
    ));
}

/// Mounts one detail page per row of the first grid page
async fn mount_rows(server: &MockServer, rows: std::ops::Range<u32>) {
    for row in rows {
        Mock::given(method("POST"))
            .and(path("/grid/results.aspx"))
            .and(body_string_contains("__VIEWSTATE=search"))
            .and(body_string_contains(format!("__EVENTARGUMENT=Title%24{}", row)))
            .respond_with(html(detail_page(row + 1)))
            .mount(server)
            .await;
    }
}

#[tokio::test]
async fn test_coordinator_over_http_grid() {
    let server = MockServer::start().await;
    mount_landing_and_search(&server).await;
    mount_rows(&server, 0..6).await;

    let mut config = test_config(&server);
    config.crawler.workers = 3;
    let settings = config.crawler.clone();
    let factory = Arc::new(HttpNavigatorFactory::new(Arc::new(config)));

    let mut coordinator = Coordinator::new(settings, factory, Vec::<RetrievedPage>::new());
    let report = coordinator.run(Range::new(1, 6).unwrap()).await.unwrap();

    assert!(report.is_complete());
    assert_eq!(report.pages, 6);
    assert_eq!(report.completed, 3);

    let mut pages = coordinator.into_sink();
    pages.sort_by_key(|p| p.row);
    let rows: Vec<u32> = pages.iter().map(|p| p.row).collect();
    assert_eq!(rows, vec![0, 1, 2, 3, 4, 5]);
    assert!(pages.iter().all(|p| p.page == 1));
    assert!(String::from_utf8_lossy(&pages[4].body).contains("Record 5"));
}

#[tokio::test]
async fn test_crawl_then_scrape() {
    let server = MockServer::start().await;
    mount_landing_and_search(&server).await;
    mount_rows(&server, 0..4).await;

    let temp = TempDir::new().unwrap();
    let html_dir = temp.path().join("html");
    let out_dir = temp.path().join("out");

    let mut config = test_config(&server);
    config.crawler.workers = 2;
    config.output.html_dir = html_dir.display().to_string();
    let base_url = Url::parse(&config.site.base_url).unwrap();

    let report = crawl(config, Range::new(1, 4).unwrap()).await.unwrap();
    assert!(report.is_complete());

    for row in 0..4 {
        assert!(html_dir.join(format!("title-1-{}.html", row)).is_file());
    }

    let titles = scrape_dir(&html_dir, &base_url).unwrap();
    let names: Vec<&str> = titles.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Record 1", "Record 2", "Record 3", "Record 4"]);
    assert_eq!(titles[0].url, format!("{}Details.aspx?id=1", base_url));
    assert_eq!(titles[0].max_rating(), Some("General Viewing"));

    let json = write_titles_json(&titles, &out_dir).unwrap();
    assert!(json.is_file());
}
