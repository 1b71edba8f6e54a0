use crate::domain::model::{BarcodeKind, BarcodeNormalization};

/// 將掃描到的條碼字串正規化成 EAN-13 形式
///
/// 非數字字元一律移除，之後依長度分派。無法辨識的長度回傳原始數字並標記為 `Unknown`，
/// 不會回傳錯誤。
pub fn normalize_barcode(raw: &str) -> BarcodeNormalization {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    let (normalized, kind) = match digits.len() {
        13 => (digits, BarcodeKind::Ean13),
        12 => (format!("0{}", digits), BarcodeKind::Upc),
        8 => (digits, BarcodeKind::Ean8),
        11 => {
            let body = format!("0{}", digits);
            match ean13_check_digit(&body) {
                Some(check) => (format!("{}{}", body, check), BarcodeKind::Upc),
                None => (digits, BarcodeKind::Unknown),
            }
        }
        _ => (digits, BarcodeKind::Unknown),
    };

    tracing::debug!("Normalized barcode {:?} -> {} ({:?})", raw, normalized, kind);
    BarcodeNormalization { normalized, kind }
}

/// Mod-10 check digit over a 12-digit EAN-13 body, weights 1/3 alternating from the left.
pub fn ean13_check_digit(body: &str) -> Option<u8> {
    if body.len() != 12 {
        return None;
    }

    let mut sum = 0u32;
    for (i, ch) in body.chars().enumerate() {
        let d = ch.to_digit(10)?;
        sum += if i % 2 == 0 { d } else { d * 3 };
    }

    Some(((10 - sum % 10) % 10) as u8)
}

pub fn is_valid_ean13(code: &str) -> bool {
    if code.len() != 13 || !code.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    let expected = ean13_check_digit(&code[..12]);
    let actual = code[12..].parse::<u8>().ok();
    expected.is_some() && expected == actual
}

/// UPC-A 驗證，也接受前綴為 0 的 EAN-13
pub fn is_valid_upca(code: &str) -> bool {
    match code.len() {
        12 => is_valid_ean13(&format!("0{}", code)),
        13 if code.starts_with('0') => is_valid_ean13(code),
        _ => false,
    }
}
