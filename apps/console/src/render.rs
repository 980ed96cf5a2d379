use std::fmt::Write as _;

use client_core::{FetchState, ListingSnapshot};

pub fn render_listing(snapshot: &ListingSnapshot) -> String {
    let mut out = String::new();
    let query = &snapshot.query;
    let _ = writeln!(
        out,
        "공용 템플릿 · {} · page {}{}",
        query.sort_order.label(),
        query.page,
        if query.search_text.is_empty() {
            String::new()
        } else {
            format!(" · 검색어 \"{}\"", query.search_text)
        }
    );
    if snapshot.role.as_ref().is_some_and(|role| role.is_admin()) {
        let _ = writeln!(out, "[관리자]");
    }

    match &snapshot.fetch {
        FetchState::Idle | FetchState::Loading => {
            let _ = writeln!(out, "로딩 중...");
        }
        FetchState::Error(message) => {
            let _ = writeln!(out, "에러 발생: {message}");
        }
        FetchState::Success(page) => {
            if page.content.is_empty() {
                let _ = writeln!(out, "표시할 템플릿이 없습니다.");
            }
            for template in &page.content {
                let _ = writeln!(
                    out,
                    "{:>6}  {:>5}  {:<10}  {}",
                    template.id.0,
                    template.share_count,
                    template.status.as_deref().unwrap_or("-"),
                    template.title
                );
            }
            let _ = writeln!(
                out,
                "{} / {} 페이지 · 전체 {}개",
                query.page, page.total_pages, page.total_elements
            );
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use client_core::QueryState;
    use shared::{
        domain::{SortOrder, TemplateId, UserRole},
        protocol::{Template, TemplatePage},
    };

    fn snapshot(fetch: FetchState) -> ListingSnapshot {
        ListingSnapshot {
            query: QueryState {
                page: 2,
                sort_order: SortOrder::MostShared,
                search_text: String::new(),
            },
            fetch,
            role: Some(UserRole::Admin),
        }
    }

    #[test]
    fn renders_cards_and_pagination_footer() {
        let page = TemplatePage {
            content: vec![Template {
                id: TemplateId(7),
                title: "배송 안내".into(),
                status: Some("APPROVED".into()),
                share_count: 12,
                created_at: None,
                content: None,
                extra: Default::default(),
            }],
            total_pages: 3,
            total_elements: 25,
        };

        let out = render_listing(&snapshot(FetchState::Success(page)));

        assert!(out.starts_with("공용 템플릿 · 공유 순 · page 2\n"));
        assert!(out.contains("[관리자]"));
        assert!(out.contains("배송 안내"));
        assert!(out.contains("APPROVED"));
        assert!(out.ends_with("2 / 3 페이지 · 전체 25개\n"));
    }

    #[test]
    fn renders_error_pane() {
        let out = render_listing(&snapshot(FetchState::Error("로그인이 필요합니다.".into())));
        assert!(out.contains("에러 발생: 로그인이 필요합니다."));
    }
}
