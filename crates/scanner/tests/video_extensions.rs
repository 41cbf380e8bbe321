use cinedex_scanner::classify::{is_video_file, should_ignore};

#[test]
fn recognizes_common_video_extensions() {
    for name in [
        "a.mp4", "b.MKV", "c.mov", "d.m2ts", "e.webm", "f.avi", "g.mpeg", "h.ts", "i.m4v", "j.WMV",
        "k.flv", "l.3gp", "m.ogv", "n.mpg",
    ] {
        assert!(is_video_file(name), "should detect {name}");
    }
}

#[test]
fn rejects_non_video_files() {
    for name in [
        "notes.txt",
        "poster.jpg",
        "subs.srt",
        "metadata.nfo",
        "archive.zip",
        "no_extension",
    ] {
        assert!(!is_video_file(name), "should NOT detect {name}");
    }
}

#[test]
fn ignores_system_and_partial_files() {
    for name in ["Thumbs.db", ".DS_Store", "desktop.ini", "movie.mkv.part", "cover.PNG"] {
        assert!(should_ignore(name), "should ignore {name}");
    }
    assert!(!should_ignore("Movie (2020).mkv"));
}
