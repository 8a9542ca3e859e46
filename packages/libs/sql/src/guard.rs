//! 식별자 / 표현식 검증
//!
//! 테이블 이름, 컬럼 목록, 정렬/그룹 표현식은 문자열 그대로 SQL에 들어가므로
//! 실행 전에 허용된 형태인지 검사합니다.

use mcrud_core::{Error, Result};

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// `schema.table.column` 처럼 점으로 연결된 식별자 (최대 3단계)
pub fn is_qualified_identifier(s: &str) -> bool {
    let parts: Vec<&str> = s.split('.').collect();
    parts.len() <= 3 && parts.iter().all(|p| is_identifier(p))
}

/// 테이블 이름 검증 (`table` 또는 `schema.table`)
pub fn check_table(table: &str) -> Result<()> {
    let table = table.trim();
    if is_qualified_identifier(table) && table.matches('.').count() <= 1 {
        Ok(())
    } else {
        Err(Error::unsafe_expression("table name", table))
    }
}

/// 레코드 키 / 컬럼 이름 검증
pub fn check_column(column: &str) -> Result<()> {
    if is_identifier(column) {
        Ok(())
    } else {
        Err(Error::unsafe_expression("column name", column))
    }
}

/// SELECT 컬럼 목록 검증
///
/// `*`, `t.*`, 식별자, `식별자 AS 별칭`의 콤마 목록만 허용합니다.
pub fn check_column_list(columns: &str) -> Result<()> {
    let ok = split_items(columns).all(|item| {
        if item == "*" {
            return true;
        }
        if let Some(prefix) = item.strip_suffix(".*") {
            return is_identifier(prefix);
        }

        let words: Vec<&str> = item.split_whitespace().collect();
        match words.as_slice() {
            [col] => is_qualified_identifier(col),
            [col, kw, alias] if kw.eq_ignore_ascii_case("as") => {
                is_qualified_identifier(col) && is_identifier(alias)
            }
            _ => false,
        }
    });

    if ok {
        Ok(())
    } else {
        Err(Error::unsafe_expression("column list", columns))
    }
}

/// ORDER BY 표현식 검증 (`col [ASC|DESC], ...`)
pub fn check_sort(sort: &str) -> Result<()> {
    let ok = split_items(sort).all(|item| {
        let words: Vec<&str> = item.split_whitespace().collect();
        match words.as_slice() {
            [col] => is_qualified_identifier(col),
            [col, dir] => {
                is_qualified_identifier(col)
                    && (dir.eq_ignore_ascii_case("asc") || dir.eq_ignore_ascii_case("desc"))
            }
            _ => false,
        }
    });

    if ok {
        Ok(())
    } else {
        Err(Error::unsafe_expression("sort expression", sort))
    }
}

/// GROUP BY 표현식 검증
pub fn check_group(group: &str) -> Result<()> {
    if split_items(group).all(is_qualified_identifier) {
        Ok(())
    } else {
        Err(Error::unsafe_expression("group expression", group))
    }
}

/// JOIN 표현식 검증
///
/// JOIN 문자열은 그대로 전달되므로 문장 구분자와 주석만 막습니다.
pub fn check_join(join: &str) -> Result<()> {
    if join.contains(';') || join.contains("--") || join.contains("/*") {
        Err(Error::unsafe_expression("join expression", join))
    } else {
        Ok(())
    }
}

/// 콤마 목록 분리 (빈 항목이 있으면 그대로 빈 문자열로 남겨 검증에서 걸리게 함)
fn split_items(expr: &str) -> impl Iterator<Item = &str> {
    expr.split(',').map(str::trim)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifiers() {
        assert!(is_identifier("sys_user"));
        assert!(is_identifier("_tmp1"));
        assert!(!is_identifier("1abc"));
        assert!(!is_identifier("name;drop"));
        assert!(!is_identifier(""));
        assert!(is_qualified_identifier("ur.user_id"));
        assert!(!is_qualified_identifier("ur..user_id"));
    }

    #[test]
    fn test_table_names() {
        assert!(check_table("sys_user").is_ok());
        assert!(check_table("public.sys_user").is_ok());
        assert!(check_table("sys_user; DROP TABLE x").is_err());
        assert!(check_table("a.b.c").is_err());
    }

    #[test]
    fn test_sort_expressions() {
        assert!(check_sort("id ASC").is_ok());
        assert!(check_sort("created_at desc, sys_user.id").is_ok());
        assert!(check_sort("id ASC, (SELECT 1)").is_err());
        assert!(check_sort("id ASC,").is_err());
        assert!(check_sort("id sideways").is_err());
    }

    #[test]
    fn test_column_lists() {
        assert!(check_column_list("*").is_ok());
        assert!(check_column_list("u.*, r.name AS role_name").is_ok());
        assert!(check_column_list("id, username").is_ok());
        assert!(check_column_list("id, (select password from x)").is_err());
    }

    #[test]
    fn test_group_and_join() {
        assert!(check_group("org_id, status").is_ok());
        assert!(check_group("org_id having 1=1").is_err());
        assert!(check_join("LEFT JOIN sys_role r ON r.id = sys_user.role_id").is_ok());
        assert!(check_join("LEFT JOIN x ON 1=1; DELETE FROM y").is_err());
    }

    #[test]
    fn test_error_kind() {
        let err = check_column("bad key").unwrap_err();
        assert_eq!(err.code(), "UNSAFE_EXPRESSION");
        assert!(err.to_string().contains("column name"));
    }
}
