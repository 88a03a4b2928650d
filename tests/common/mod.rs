#![allow(dead_code)]

use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tos_harvester::config::{PacingMode, PatternSettings};
use tos_harvester::Settings;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Gallery index page linking to `hrefs` the way the wiki lays them out.
pub fn index_page(hrefs: &[&str]) -> String {
    let cells: String = hrefs
        .iter()
        .map(|h| {
            format!(
                r#"<td style="font-size: 1.2em"><b><a href="{}" title="card">card</a></b></td>"#,
                h
            )
        })
        .collect();
    format!(
        r#"<!DOCTYPE html><html><body><div id="content">
        <table class="shadow"><tbody><tr>{}</tr></tbody></table>
        </div></body></html>"#,
        cells
    )
}

pub struct CardPage<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub active: &'a str,
    pub active_effect: &'a str,
    pub leader: &'a str,
    pub leader_effect: &'a str,
}

/// Card article whose `td` cells sit at the positions a real detail page uses.
pub fn card_page(c: &CardPage) -> String {
    let mut cells = vec![String::new(); 32];
    cells[0] = format!(
        r#"<img src="data:image/gif;base64,R0lGOD" data-src="https://vignette.example/{}.png">"#,
        c.id
    );
    cells[1] = c.name.to_string();
    cells[2] = r#"<a href="/wiki/Light">Light</a>"#.to_string();
    cells[3] = format!("No.{}", c.id);
    cells[4] = "6★".to_string();
    cells[5] = "18".to_string();
    cells[6] = r#"<a href="/wiki/Elf">Elf</a>"#.to_string();
    cells[7] = "Guardians".to_string();
    cells[10] = "5,000,000".to_string();
    cells[18] = "2100+400".to_string();
    cells[19] = "1100+200".to_string();
    cells[20] = "500".to_string();
    cells[21] = "3700+600".to_string();
    cells[25] = format!(r#"<a href="/wiki/Skill">{}</a>"#, c.active);
    cells[26] = "12".to_string();
    cells[27] = "6".to_string();
    cells[28] = c.active_effect.to_string();
    cells[30] = format!(r#"<a href="/wiki/Leader">{}</a>"#, c.leader);
    cells[31] = c.leader_effect.to_string();
    let tds: String = cells.iter().map(|c| format!("<td>{}</td>\n", c)).collect();
    format!(
        r#"<!DOCTYPE html><html><body><article>
        <table class="shadow"><tbody><tr>{}</tr></tbody></table>
        </article></body></html>"#,
        tds
    )
}

pub async fn serve(server: &MockServer, url_path: &str, html: String, delay_ms: u64) {
    Mock::given(method("GET"))
        .and(path(url_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_delay(Duration::from_millis(delay_ms)),
        )
        .mount(server)
        .await;
}

pub async fn fail(server: &MockServer, url_path: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(url_path))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Settings pointing one pattern at the mock server, with no pacing delay.
pub fn settings_for(server: &MockServer, template: &str, count: usize) -> Settings {
    let mut s = Settings::default();
    s.base_url = server.uri();
    s.patterns = vec![PatternSettings {
        template: format!("{}{}", server.uri(), template),
        start: 0,
        count,
    }];
    s.pacing.mode = PacingMode::FixedDelay;
    s.pacing.delay_secs = 0.0;
    s.fetch_timeout_secs = 5;
    s
}

pub fn read_rows(bytes: &[u8]) -> Vec<Vec<String>> {
    csv::ReaderBuilder::new()
        .delimiter(b'$')
        .from_reader(bytes)
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect()
}

/// Shared buffer the test subscriber writes formatted log lines into.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn lines(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap();
        String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Route this thread's events at `warn` and above into a buffer. Only valid on the
/// current-thread runtime, where spawned workers log on the test thread.
pub fn capture_warnings() -> (tracing::subscriber::DefaultGuard, LogBuffer) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    (tracing::subscriber::set_default(subscriber), buffer)
}
