use super::*;

const FIXTURE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <channel>
    <title>스포츠</title>
    <item>
      <title><![CDATA[손흥민, 시즌 10호골]]></title>
      <link> https://www.yna.co.kr/view/AKR1 </link>
      <description><![CDATA[<p>토트넘&nbsp;승리</p>]]></description>
      <dc:creator>기자A</dc:creator>
      <pubDate>Sat, 18 Oct 2026 09:00:00 +0900</pubDate>
    </item>
    <item>
      <title>두번째 기사 &ldquo;인용&rdquo;</title>
      <link>https://www.yna.co.kr/view/AKR2</link>
    </item>
  </channel>
</rss>"#;

#[test]
fn parses_items_in_order() {
    let entries = parse_rss(FIXTURE).unwrap();
    assert_eq!(entries.len(), 2);

    let first = &entries[0];
    assert_eq!(first.title, "손흥민, 시즌 10호골");
    assert_eq!(first.link, "https://www.yna.co.kr/view/AKR1");
    assert!(first.description.as_deref().unwrap().contains("토트넘"));
    assert_eq!(first.author.as_deref(), Some("기자A"));
    assert_eq!(
        first.published.as_deref(),
        Some("Sat, 18 Oct 2026 09:00:00 +0900")
    );

    let second = &entries[1];
    assert_eq!(second.title, "두번째 기사 \"인용\"");
    assert_eq!(second.description, None);
    assert_eq!(second.author, None);
}

#[test]
fn plain_author_wins_over_creator() {
    let xml = r#"<rss version="2.0" xmlns:dc="http://purl.org/dc/elements/1.1/"><channel>
<item><title>t</title><link>https://a/1</link><author>desk@a</author><dc:creator>기자B</dc:creator></item>
</channel></rss>"#;
    let entries = parse_rss(xml).unwrap();
    assert_eq!(entries[0].author.as_deref(), Some("desk@a"));
}

#[test]
fn empty_channel_is_ok() {
    let xml = r#"<rss version="2.0"><channel><title>x</title></channel></rss>"#;
    assert!(parse_rss(xml).unwrap().is_empty());
}

#[test]
fn malformed_xml_is_feed_error() {
    let err = parse_rss("<rss><channel><item>").unwrap_err();
    assert!(matches!(err, ReelError::Feed(_)));
}

#[test]
fn scrubs_html_only_entities() {
    assert_eq!(scrub_html_entities_for_xml("a&nbsp;b&mdash;c"), "a b-c");
}
