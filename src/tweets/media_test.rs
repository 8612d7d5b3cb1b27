use super::media::{archive_key, profile_image_key, resolve_media, select_variant};
use crate::{
  fetch_types::{ApiMedia, ApiVariant},
  types::MediaKind,
};

fn variant(content_type: &str, url: &str) -> ApiVariant {
  ApiVariant {
    content_type: content_type.to_string(),
    url: url.to_string(),
    bit_rate: None,
  }
}

fn photo(key: &str, url: &str) -> ApiMedia {
  ApiMedia {
    media_key: key.to_string(),
    kind: "photo".to_string(),
    url: Some(url.to_string()),
    alt_text: Some("a cat".to_string()),
    variants: None,
  }
}

fn video(key: &str, variants: Vec<ApiVariant>) -> ApiMedia {
  ApiMedia {
    media_key: key.to_string(),
    kind: "video".to_string(),
    url: None,
    alt_text: None,
    variants: Some(variants),
  }
}

/* ---------------------------- variant selection ---------------------------- */

#[test]
fn media_test_select_640() {
  println!("select_variant()  //  640 rendition preferred over first");
  let variants = vec![
    variant("application/x-mpegURL", "https://video.twimg.com/pl/abc.m3u8?tag=12"),
    variant("video/mp4", "https://video.twimg.com/vid/1280x720/hi.mp4"),
    variant("video/mp4", "https://video.twimg.com/vid/640x360/mid.mp4"),
    variant("video/mp4", "https://video.twimg.com/vid/480x270/lo.mp4"),
  ];
  assert_eq!(select_variant(&variants).unwrap().url, "https://video.twimg.com/vid/640x360/mid.mp4");
}

#[test]
fn media_test_select_first_tag_wins() {
  println!("select_variant()  //  480 listed before 640 is taken");
  let variants = vec![
    variant("video/mp4", "https://video.twimg.com/vid/480x270/lo.mp4"),
    variant("video/mp4", "https://video.twimg.com/vid/640x360/mid.mp4"),
  ];
  assert_eq!(select_variant(&variants).unwrap().url, "https://video.twimg.com/vid/480x270/lo.mp4");
}

#[test]
fn media_test_select_ignores_non_mp4_tags() {
  let variants = vec![
    variant("application/x-mpegURL", "https://video.twimg.com/pl/640/abc.m3u8"),
    variant("video/mp4", "https://video.twimg.com/vid/320x180/tiny.mp4"),
  ];
  // no mp4 carries a tag, so the first rendition as listed
  assert_eq!(select_variant(&variants).unwrap().url, "https://video.twimg.com/pl/640/abc.m3u8");
}

#[test]
fn media_test_select_single_and_empty() {
  let single = vec![variant("video/mp4", "https://video.twimg.com/tweet_video/gif.mp4")];
  assert_eq!(select_variant(&single).unwrap().url, "https://video.twimg.com/tweet_video/gif.mp4");
  assert!(select_variant(&[]).is_none());
}

#[test]
fn media_test_select_is_deterministic() {
  let variants = vec![
    variant("video/mp4", "https://video.twimg.com/vid/1280x720/hi.mp4"),
    variant("video/mp4", "https://video.twimg.com/vid/640x360/mid.mp4"),
  ];
  let first = select_variant(&variants).unwrap().url.clone();
  for _ in 0..10 {
    assert_eq!(select_variant(&variants).unwrap().url, first);
  }
}

/* ------------------------------ media records ------------------------------ */

#[test]
fn media_test_resolve() {
  println!("resolve_media()  //  photo and video keep upstream order");
  let media = vec![
    photo("3_1", "https://pbs.twimg.com/media/abc.jpg"),
    video("7_2", vec![
      variant("video/mp4", "https://video.twimg.com/vid/1280x720/hi.mp4?tag=12"),
      variant("video/mp4", "https://video.twimg.com/vid/640x360/mid.mp4?tag=12"),
    ]),
  ];
  let records = resolve_media(&media, "1234567890123456789");
  assert_eq!(records.len(), 2);

  assert_eq!(records[0].kind, MediaKind::Photo);
  assert_eq!(records[0].source_url, "https://pbs.twimg.com/media/abc.jpg");
  assert_eq!(records[0].archive_key, "1234567890123456789-abc.jpg");
  assert_eq!(records[0].alt_text.as_deref(), Some("a cat"));

  assert_eq!(records[1].kind, MediaKind::Video);
  assert_eq!(records[1].source_url, "https://video.twimg.com/vid/640x360/mid.mp4?tag=12");
  assert_eq!(records[1].archive_key, "1234567890123456789-mid.mp4");
}

#[test]
fn media_test_resolve_drops_unusable() {
  let mut no_url = photo("3_1", "");
  no_url.url = None;
  let mut unknown = photo("9_9", "https://pbs.twimg.com/media/x.jpg");
  unknown.kind = "hologram".to_string();
  assert!(resolve_media(&[no_url, unknown], "1").is_empty());
  assert!(resolve_media(&[], "1").is_empty());
}

#[test]
fn media_test_keys() {
  let urls = [
    "https://pbs.twimg.com/media/abc.jpg",
    "https://pbs.twimg.com/media/abc.jpg?format=jpg&name=large",
    "https://video.twimg.com/vid/640x360/abc.jpg#t=1",
  ];
  for url in urls {
    assert_eq!(archive_key("42", url), "42-abc.jpg");
  }
  assert_eq!(
    profile_image_key("9876543210", "https://pbs.twimg.com/profile_images/1/abcdefg_normal.jpg"),
    "profile_images/9876543210-abcdefg_normal.jpg"
  );
}
