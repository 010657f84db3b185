use scraper::{ElementRef, Html, Selector};
use log::warn;
use url::Url;

use crate::error::{ExtractionError, HarvestError};
use crate::record::{WorkRecord, ANONYMOUS, UNKNOWN_DATE, UNKNOWN_TITLE};

/// Work items on a listing page, most specific first.
pub const WORK_ITEM_SELECTORS: &[&str] = &["li.work.blurb.group", "li.work"];

const TITLE_HEADING_SELECTORS: &[&str] = &["h4.heading", "h4"];
const AUTHOR_SELECTORS: &[&str] = &["a[rel~=\"author\"]"];
const STATS_SELECTORS: &[&str] = &["dl.stats"];
const TAG_LIST_SELECTORS: &[&str] = &["ul.tags.commas", "ul.tags"];
const DATE_SELECTORS: &[&str] = &["p.datetime"];
const WORDS_SELECTORS: &[&str] = &["dd.words"];

/// Ordered fallbacks for one lookup. The first selector that matches anything wins.
#[derive(Debug)]
pub struct SelectorChain {
    selectors: Vec<Selector>,
}

impl SelectorChain {
    pub fn parse(patterns: &[&str]) -> Result<Self, HarvestError> {
        let selectors = patterns
            .iter()
            .map(|p| {
                Selector::parse(p).map_err(|e| HarvestError::Selector {
                    selector: p.to_string(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SelectorChain { selectors })
    }

    /// First element under `scope` matched by the earliest selector that matches.
    pub fn first_in<'a>(&self, scope: ElementRef<'a>) -> Option<ElementRef<'a>> {
        self.selectors
            .iter()
            .find_map(|selector| scope.select(selector).next())
    }

    /// Every element of the first selector that yields a non-empty result, in
    /// document order. Empty when no selector matches.
    pub fn all_in<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        for selector in &self.selectors {
            let found: Vec<_> = document.select(selector).collect();
            if !found.is_empty() {
                return found;
            }
        }
        Vec::new()
    }
}

/// Maps one work node to a [`WorkRecord`]. Every field is looked up on its own,
/// so a missing block only leaves that field at its sentinel.
pub struct Extractor {
    origin: Url,
    title_heading: SelectorChain,
    link: Selector,
    author: SelectorChain,
    stats: SelectorChain,
    stat_value: Selector,
    tag_list: SelectorChain,
    tag_link: Selector,
    date: SelectorChain,
    words: SelectorChain,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Counters {
    kudos: u64,
    comments: u64,
    bookmarks: u64,
    hits: u64,
}

impl Extractor {
    /// `origin` is the site root that relative work links are resolved against.
    pub fn new(origin: Url) -> Result<Self, HarvestError> {
        Ok(Extractor {
            origin,
            title_heading: SelectorChain::parse(TITLE_HEADING_SELECTORS)?,
            link: single("a")?,
            author: SelectorChain::parse(AUTHOR_SELECTORS)?,
            stats: SelectorChain::parse(STATS_SELECTORS)?,
            stat_value: single("dd")?,
            tag_list: SelectorChain::parse(TAG_LIST_SELECTORS)?,
            tag_link: single("a.tag")?,
            date: SelectorChain::parse(DATE_SELECTORS)?,
            words: SelectorChain::parse(WORDS_SELECTORS)?,
        })
    }

    pub fn extract(&self, work: ElementRef<'_>) -> Result<WorkRecord, ExtractionError> {
        let (title, url) = self.title_and_url(work);
        let counters = self.counters(work);

        Ok(WorkRecord {
            title,
            author: self.author(work),
            url,
            kudos: counters.kudos,
            comments: counters.comments,
            bookmarks: counters.bookmarks,
            hits: counters.hits,
            tags: self.tags(work),
            publication_date: self.publication_date(work),
            word_count: self.word_count(work)?,
        })
    }

    fn title_and_url(&self, work: ElementRef<'_>) -> (String, String) {
        let link = self
            .title_heading
            .first_in(work)
            .and_then(|heading| heading.select(&self.link).next());

        let Some(link) = link else {
            return (UNKNOWN_TITLE.to_string(), String::new());
        };

        let title = non_empty(stripped_text(link)).unwrap_or_else(|| UNKNOWN_TITLE.to_string());
        let url = link
            .value()
            .attr("href")
            .map(str::trim)
            .filter(|href| !href.is_empty())
            .and_then(|href| self.origin.join(href).ok())
            .map(String::from)
            .unwrap_or_default();
        (title, url)
    }

    fn author(&self, work: ElementRef<'_>) -> String {
        self.author
            .first_in(work)
            .and_then(|a| non_empty(stripped_text(a)))
            .unwrap_or_else(|| ANONYMOUS.to_string())
    }

    fn counters(&self, work: ElementRef<'_>) -> Counters {
        let mut counters = Counters::default();
        let Some(stats) = self.stats.first_in(work) else {
            return counters;
        };

        for dd in stats.select(&self.stat_value) {
            let text = stripped_text(dd).replace(',', "");
            if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
                continue;
            }

            let classes: Vec<&str> = dd.value().classes().collect();
            let (field, slot) = if classes.contains(&"kudos") {
                ("kudos", &mut counters.kudos)
            } else if classes.contains(&"comments") {
                ("comments", &mut counters.comments)
            } else if classes.contains(&"bookmarks") {
                ("bookmarks", &mut counters.bookmarks)
            } else if classes.contains(&"hits") {
                ("hits", &mut counters.hits)
            } else {
                continue;
            };

            // digits only, so the one parse failure left is overflow
            *slot = text.parse().unwrap_or_else(|_| {
                warn!("{} value {} too large, capped at {}", field, text, u64::MAX);
                u64::MAX
            });
        }
        counters
    }

    fn tags(&self, work: ElementRef<'_>) -> Vec<String> {
        self.tag_list
            .first_in(work)
            .map(|list| {
                list.select(&self.tag_link)
                    .map(|tag| tag.text().collect::<String>().trim().to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn publication_date(&self, work: ElementRef<'_>) -> String {
        self.date
            .first_in(work)
            .and_then(|p| non_empty(p.text().collect::<String>().trim().to_string()))
            .unwrap_or_else(|| UNKNOWN_DATE.to_string())
    }

    fn word_count(&self, work: ElementRef<'_>) -> Result<u64, ExtractionError> {
        let Some(words) = self.words.first_in(work) else {
            return Ok(0);
        };
        let raw = words.text().collect::<String>().trim().to_string();
        if raw.is_empty() {
            return Ok(0);
        }
        raw.replace(',', "")
            .parse()
            .map_err(|_| ExtractionError::WordCount { raw })
    }
}

fn single(pattern: &str) -> Result<Selector, HarvestError> {
    Selector::parse(pattern).map_err(|e| HarvestError::Selector {
        selector: pattern.to_string(),
        reason: e.to_string(),
    })
}

/// Text of every fragment trimmed and concatenated, so `<dd> 1,2 <b>3</b></dd>` reads "1,23".
fn stripped_text(el: ElementRef<'_>) -> String {
    el.text().map(str::trim).collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_WORK: &str = r#"
<li class="work blurb group" id="work_1">
  <div class="header module">
    <h4 class="heading">
      <a href="/works/101">  A  </a>
      by
      <a rel="author" href="/users/bob">Bob</a>
    </h4>
    <p class="datetime">12 Mar 2024</p>
  </div>
  <ul class="tags commas">
    <li class="freeforms"><a class="tag" href="/tags/Angst">Angst</a></li>
    <li class="freeforms"><a class="tag" href="/tags/Fluff"> Fluff </a></li>
  </ul>
  <dl class="stats">
    <dt class="language">Language:</dt><dd class="language">English</dd>
    <dt class="words">Words:</dt><dd class="words">1,234</dd>
    <dt class="chapters">Chapters:</dt><dd class="chapters">1/1</dd>
    <dt class="comments">Comments:</dt><dd class="comments"><a href="/c">5</a></dd>
    <dt class="kudos">Kudos:</dt><dd class="kudos"><a href="/k">1,010</a></dd>
    <dt class="bookmarks">Bookmarks:</dt><dd class="bookmarks"><a href="/b">7</a></dd>
    <dt class="hits">Hits:</dt><dd class="hits">20,345</dd>
  </dl>
</li>"#;

    fn extractor() -> Extractor {
        Extractor::new(Url::parse("https://archiveofourown.org").unwrap()).unwrap()
    }

    fn extract_first(html: &str) -> Result<WorkRecord, ExtractionError> {
        let document = Html::parse_fragment(html);
        let chain = SelectorChain::parse(WORK_ITEM_SELECTORS).unwrap();
        let nodes = chain.all_in(&document);
        assert!(!nodes.is_empty(), "fixture has no work node");
        extractor().extract(nodes[0])
    }

    #[test]
    fn extracts_fully_populated_work() {
        let record = extract_first(FULL_WORK).unwrap();
        assert_eq!(record.title, "A");
        assert_eq!(record.author, "Bob");
        assert_eq!(record.url, "https://archiveofourown.org/works/101");
        assert_eq!(record.kudos, 1010);
        assert_eq!(record.comments, 5);
        assert_eq!(record.bookmarks, 7);
        assert_eq!(record.hits, 20345);
        assert_eq!(record.tags, vec!["Angst".to_string(), "Fluff".to_string()]);
        assert_eq!(record.publication_date, "12 Mar 2024");
        assert_eq!(record.word_count, 1234);
    }

    #[test]
    fn missing_stats_block_leaves_counters_at_zero() {
        let record = extract_first(
            r#"<li class="work"><h4 class="heading"><a href="/works/2">B</a></h4></li>"#,
        )
        .unwrap();
        assert_eq!(
            (record.kudos, record.comments, record.bookmarks, record.hits),
            (0, 0, 0, 0)
        );
        assert_eq!(record.word_count, 0);
    }

    #[test]
    fn missing_author_link_is_anonymous() {
        let record = extract_first(
            r#"<li class="work"><h4 class="heading"><a href="/works/3">C</a> by Anonymous</h4></li>"#,
        )
        .unwrap();
        assert_eq!(record.author, "Anonymous");
    }

    #[test]
    fn author_rel_may_carry_other_tokens() {
        let record = extract_first(
            r#"<li class="work"><a rel="nofollow author" href="/u">Ann</a></li>"#,
        )
        .unwrap();
        assert_eq!(record.author, "Ann");
    }

    #[test]
    fn heading_without_marker_class_still_gives_title() {
        let record =
            extract_first(r#"<li class="work"><h4><a href="/works/9">Plain</a></h4></li>"#).unwrap();
        assert_eq!(record.title, "Plain");
        assert_eq!(record.url, "https://archiveofourown.org/works/9");
    }

    #[test]
    fn absolute_href_is_kept() {
        let record = extract_first(
            r#"<li class="work"><h4 class="heading"><a href="https://example.org/works/4">D</a></h4></li>"#,
        )
        .unwrap();
        assert_eq!(record.url, "https://example.org/works/4");
    }

    #[test]
    fn no_heading_link_gives_unknown_title_and_empty_url() {
        let record = extract_first(r#"<li class="work"><h4 class="heading">Locked</h4></li>"#).unwrap();
        assert_eq!(record.title, "Unknown");
        assert_eq!(record.url, "");
    }

    #[test]
    fn empty_node_gets_every_sentinel() {
        let record = extract_first(r#"<li class="work"></li>"#).unwrap();
        assert_eq!(record, WorkRecord::default());
    }

    #[test]
    fn non_numeric_and_unknown_stats_are_ignored() {
        let record = extract_first(
            r#"<li class="work"><dl class="stats">
                 <dd class="kudos">lots</dd>
                 <dd class="hits">-5</dd>
                 <dd class="chapters">3</dd>
                 <dd class="comments">12</dd>
               </dl></li>"#,
        )
        .unwrap();
        assert_eq!(record.kudos, 0);
        assert_eq!(record.hits, 0);
        assert_eq!(record.comments, 12);
    }

    #[test]
    fn empty_word_count_is_zero() {
        let record = extract_first(
            r#"<li class="work"><dl class="stats"><dd class="words">  </dd></dl></li>"#,
        )
        .unwrap();
        assert_eq!(record.word_count, 0);
    }

    #[test]
    fn non_numeric_word_count_rejects_node() {
        let err = extract_first(
            r#"<li class="work"><dl class="stats"><dd class="words">n/a</dd></dl></li>"#,
        )
        .unwrap_err();
        assert_eq!(err, ExtractionError::WordCount { raw: "n/a".to_string() });
    }

    #[test]
    fn oversized_counter_saturates_and_keeps_node() {
        let record = extract_first(
            r#"<li class="work"><h4 class="heading"><a href="/works/5">Big</a></h4>
               <a rel="author" href="/u">Zed</a>
               <dl class="stats">
                 <dd class="hits">99999999999999999999999</dd>
                 <dd class="kudos">4</dd>
               </dl></li>"#,
        )
        .unwrap();
        assert_eq!(record.hits, u64::MAX);
        assert_eq!(record.kudos, 4);
        assert_eq!(record.title, "Big");
        assert_eq!(record.author, "Zed");
    }

    #[test]
    fn tags_fall_back_to_plain_tag_list() {
        let record = extract_first(
            r#"<li class="work"><ul class="tags"><li><a class="tag">X</a></li><li><a class="tag">X</a></li></ul></li>"#,
        )
        .unwrap();
        assert_eq!(record.tags, vec!["X".to_string(), "X".to_string()]);
    }

    #[test]
    fn primary_item_selector_wins_over_broad_one() {
        let document = Html::parse_fragment(
            r#"<ul><li class="work">loose</li><li class="work blurb group">blurb</li></ul>"#,
        );
        let nodes = SelectorChain::parse(WORK_ITEM_SELECTORS).unwrap().all_in(&document);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].text().collect::<String>(), "blurb");
    }

    #[test]
    fn broad_item_selector_used_when_primary_is_empty() {
        let document =
            Html::parse_fragment(r#"<ul><li class="work">one</li><li class="work reading">two</li></ul>"#);
        let nodes = SelectorChain::parse(WORK_ITEM_SELECTORS).unwrap().all_in(&document);
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn bad_selector_is_reported() {
        let err = SelectorChain::parse(&["li[["]).unwrap_err();
        assert!(matches!(err, HarvestError::Selector { .. }));
    }
}
