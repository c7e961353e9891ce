use bigram_core::terms::extract_terms;
use bigram_core::tokenizer::{ScriptRunTokenizer, Tokenizer};
use criterion::{criterion_group, criterion_main, Criterion};

const TEXT: &str = "全文検索エンジンの索引は静的サイトの文書からバイグラムを抽出して作成します。\
Rust builds the inverted index offline and the browser reads it with HTTP range requests. \
形態素解析の結果から名詞と動詞を残し、それ以外の品詞は捨てます。";

fn bench_extract(c: &mut Criterion) {
    let text = TEXT.repeat(50);
    let tokens = ScriptRunTokenizer.tokenize(&text).expect("builtin tokenizer is infallible");
    c.bench_function("tokenize_mixed_script", |b| b.iter(|| ScriptRunTokenizer.tokenize(&text)));
    c.bench_function("extract_terms_mixed_script", |b| b.iter(|| extract_terms(&tokens)));
}

criterion_group!(benches, bench_extract);
criterion_main!(benches);
