use surat_extract::normalize;

const SAMPLES: [&str; 6] = [
    "Nomor : 451/KS.O2.OO\r\nPerihal :\t  Undangan   Rapat\n\n\n\nKepada Yth.",
    "OS '/ KB.03.00 tanggal 20 Januari 2025",
    "Nomor 12\\/AB.01.02",
    "  Hal \u{2018}Permohonan\u{2019} Data  ",
    "",
    "Oleh karena itu kami mohon bantuan Bapak/Ibu",
];

#[test]
fn normalize_is_idempotent() {
    for sample in SAMPLES {
        let once = normalize(sample);
        assert_eq!(normalize(&once), once, "not a fixed point for {sample:?}");
    }
}

#[test]
fn empty_input_gives_empty_output() {
    assert_eq!(normalize(""), "");
    assert_eq!(normalize(" \n\t\n "), "");
}

#[test]
fn digit_letter_confusion_fixed_only_inside_numbers() {
    let out = normalize("Nomor : 451/KS.O2.OO\nOleh karena itu");
    assert!(out.contains("451/KS.02.00"), "{out}");
    assert!(out.contains("Oleh karena itu"), "{out}");
}

#[test]
fn whitespace_collapses_but_lines_survive() {
    let out = normalize("Perihal :\t  Undangan   Rapat\r\n\n\n\nKepada Yth.");
    assert_eq!(out, "Perihal : Undangan Rapat\n\nKepada Yth.");
}

#[test]
fn backslash_before_slash_is_merged() {
    assert_eq!(normalize("Nomor 12\\/AB.01.02"), "Nomor 12/AB.01.02");
}

#[test]
fn quote_variants_become_spaces() {
    assert_eq!(normalize("Hal \u{2018}Permohonan\u{2019} Data"), "Hal Permohonan Data");
}
