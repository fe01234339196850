//! Built-in content code table.
//!
//! Enough to decode every response this workspace produces and to bootstrap
//! the `/content-codes` exchange with a server that knows more.

use crate::code::ContentType;

/// Codes needed to parse a `dmap.contentcodesresponse` at all.
pub(crate) const BOOTSTRAP_CODES: &[([u8; 4], &str, ContentType)] = &[
    (*b"mccr", "dmap.contentcodesresponse", ContentType::Container),
    (*b"mdcl", "dmap.dictionary", ContentType::Container),
    (*b"mcnm", "dmap.contentcodesnumber", ContentType::Int),
    (*b"mcna", "dmap.contentcodesname", ContentType::String),
    (*b"mcty", "dmap.contentcodestype", ContentType::Short),
    (*b"mstt", "dmap.status", ContentType::Int),
];

/// The full built-in table, in registration order.
pub(crate) const BUILTIN_CODES: &[([u8; 4], &str, ContentType)] = &[
    (*b"ppro", "dpap.protocolversion", ContentType::Int),
    (*b"pret", "dpap.blah", ContentType::Container),
    (*b"abal", "daap.browsealbumlisting", ContentType::Container),
    (*b"abar", "daap.browseartistlisting", ContentType::Container),
    (*b"abcp", "daap.browsecomposerlisting", ContentType::Container),
    (*b"abgn", "daap.browsegenrelisting", ContentType::Container),
    (*b"abpl", "daap.baseplaylist", ContentType::Byte),
    (*b"abro", "daap.databasebrowse", ContentType::Container),
    (*b"adbs", "daap.databasesongs", ContentType::Container),
    (*b"aeAI", "com.apple.itunes.itms-artistid", ContentType::Int),
    (*b"aeCI", "com.apple.itunes.itms-composerid", ContentType::Int),
    (*b"aeCR", "com.apple.itunes.content-rating", ContentType::String),
    (*b"aeEN", "com.apple.itunes.episode-num-str", ContentType::String),
    (*b"aeES", "com.apple.itunes.episode-sort", ContentType::Int),
    (*b"aeFP", "com.apple.itunes.req-fplay", ContentType::Byte),
    (*b"aeGD", "com.apple.itunes.gapless-enc-dr", ContentType::Int),
    (*b"aeGE", "com.apple.itunes.gapless-enc-del", ContentType::Int),
    (*b"aeGH", "com.apple.itunes.gapless-heur", ContentType::Int),
    (*b"aeGI", "com.apple.itunes.itms-genreid", ContentType::Int),
    (*b"aeGR", "com.apple.itunes.gapless-resy", ContentType::Long),
    (*b"aeGU", "com.apple.itunes.gapless-dur", ContentType::Long),
    (*b"aeHV", "com.apple.itunes.has-video", ContentType::Byte),
    (*b"aeMK", "com.apple.itunes.mediakind", ContentType::Byte),
    (*b"aeNN", "com.apple.itunes.network-name", ContentType::String),
    (*b"aeNV", "com.apple.itunes.norm-volume", ContentType::Int),
    (*b"aePC", "com.apple.itunes.is-podcast", ContentType::Byte),
    (*b"aePI", "com.apple.itunes.itms-playlistid", ContentType::Int),
    (*b"aePP", "com.apple.itunes.is-podcast-playlist", ContentType::Byte),
    (*b"aePS", "com.apple.itunes.special-playlist", ContentType::Byte),
    (*b"aeSF", "com.apple.itunes.itms-storefrontid", ContentType::Int),
    (*b"aeSI", "com.apple.itunes.itms-songid", ContentType::Int),
    (*b"aeSN", "com.apple.itunes.series-name", ContentType::String),
    (*b"aeSP", "com.apple.itunes.smart-playlist", ContentType::Byte),
    (*b"aeSU", "com.apple.itunes.season-num", ContentType::Int),
    (*b"aeSV", "com.apple.itunes.music-sharing-version", ContentType::Int),
    (*b"agal", "daap.albumgrouping", ContentType::Container),
    (*b"agrp", "daap.songgrouping", ContentType::String),
    (*b"aply", "daap.databaseplaylists", ContentType::Container),
    (*b"aprm", "daap.playlistrepeatmode", ContentType::Byte),
    (*b"apro", "daap.protocolversion", ContentType::Version),
    (*b"apsm", "daap.playlistshufflemode", ContentType::Byte),
    (*b"apso", "daap.playlistsongs", ContentType::Container),
    (*b"arif", "daap.resolveinfo", ContentType::Container),
    (*b"arsv", "daap.resolve", ContentType::Container),
    (*b"asaa", "daap.songalbumartist", ContentType::String),
    (*b"asai", "daap.songalbumid", ContentType::Long),
    (*b"asal", "daap.songalbum", ContentType::String),
    (*b"asar", "daap.songartist", ContentType::String),
    (*b"asbk", "daap.bookmarkable", ContentType::Byte),
    (*b"asbo", "daap.songbookmark", ContentType::Int),
    (*b"asbr", "daap.songbitrate", ContentType::Short),
    (*b"asbt", "daap.songbeatsperminute", ContentType::Short),
    (*b"ascd", "daap.songcodectype", ContentType::Int),
    (*b"ascm", "daap.songcomment", ContentType::String),
    (*b"ascn", "daap.songcontentdescription", ContentType::String),
    (*b"asco", "daap.songcompilation", ContentType::Byte),
    (*b"ascp", "daap.songcomposer", ContentType::String),
    (*b"ascr", "daap.songcontentrating", ContentType::Byte),
    (*b"ascs", "daap.songcodecsubtype", ContentType::Int),
    (*b"asct", "daap.songcategory", ContentType::String),
    (*b"asda", "daap.songdateadded", ContentType::Date),
    (*b"asdb", "daap.songdisabled", ContentType::Byte),
    (*b"asdc", "daap.songdisccount", ContentType::Short),
    (*b"asdk", "daap.songdatakind", ContentType::Byte),
    (*b"asdm", "daap.songdatemodified", ContentType::Date),
    (*b"asdn", "daap.songdiscnumber", ContentType::Short),
    (*b"asdp", "daap.songdatepurchased", ContentType::Date),
    (*b"asdr", "daap.songdatereleased", ContentType::Date),
    (*b"asdt", "daap.songdescription", ContentType::String),
    (*b"ased", "daap.songextradata", ContentType::Short),
    (*b"aseq", "daap.songeqpreset", ContentType::String),
    (*b"asfm", "daap.songformat", ContentType::String),
    (*b"asgn", "daap.songgenre", ContentType::String),
    (*b"asgp", "daap.songgapless", ContentType::Byte),
    (*b"ashp", "daap.songhasbeenplayed", ContentType::Byte),
    (*b"asky", "daap.songkeywords", ContentType::String),
    (*b"aslc", "daap.songlongcontentdescription", ContentType::String),
    (*b"aspu", "daap.songpodcasturl", ContentType::String),
    (*b"asrv", "daap.songrelativevolume", ContentType::SignedByte),
    (*b"assa", "daap.sortartist", ContentType::String),
    (*b"assc", "daap.sortcomposer", ContentType::String),
    (*b"assl", "daap.sortalbumartist", ContentType::String),
    (*b"assn", "daap.sortname", ContentType::String),
    (*b"assp", "daap.songstoptime", ContentType::Int),
    (*b"assr", "daap.songsamplerate", ContentType::Int),
    (*b"asss", "daap.sortseriesname", ContentType::String),
    (*b"asst", "daap.songstarttime", ContentType::Int),
    (*b"assu", "daap.sortalbum", ContentType::String),
    (*b"assz", "daap.songsize", ContentType::Int),
    (*b"astc", "daap.songtrackcount", ContentType::Short),
    (*b"astm", "daap.songtime", ContentType::Int),
    (*b"astn", "daap.songtracknumber", ContentType::Short),
    (*b"asul", "daap.songdataurl", ContentType::String),
    (*b"asur", "daap.songuserrating", ContentType::Byte),
    (*b"asyr", "daap.songyear", ContentType::Short),
    (*b"ated", "daap.supportsextradata", ContentType::Short),
    (*b"avdb", "daap.serverdatabases", ContentType::Container),
    (*b"caar", "dacp.albumrepeat", ContentType::Int),
    (*b"caas", "dacp.albumshuffle", ContentType::Int),
    (*b"caci", "dacp.controlint", ContentType::Container),
    (*b"caia", "dacp.isavailable", ContentType::Byte),
    (*b"cana", "dacp.nowplayingartist", ContentType::String),
    (*b"cang", "dacp.nowplayinggenre", ContentType::String),
    (*b"canl", "dacp.nowplayingalbum", ContentType::String),
    (*b"cann", "dacp.nowplayingname", ContentType::String),
    (*b"canp", "dacp.nowplaying", ContentType::Long),
    (*b"cant", "dacp.remainingtime", ContentType::Int),
    (*b"caps", "dacp.state", ContentType::Int),
    (*b"carp", "dacp.repeat", ContentType::Int),
    (*b"cash", "dacp.shuffle", ContentType::Int),
    (*b"casp", "dacp.speakers", ContentType::Container),
    (*b"cass", "dacp.ss", ContentType::Byte),
    (*b"cast", "dacp.songtime", ContentType::Int),
    (*b"casu", "dacp.su", ContentType::Byte),
    (*b"ceSG", "dacp.sg", ContentType::Byte),
    (*b"cmcp", "dmcp.controlprompt", ContentType::Container),
    (*b"cmgt", "dmcp.getpropertyresponse", ContentType::Container),
    (*b"cmik", "dmcp.ik", ContentType::Byte),
    (*b"cmmk", "dmcp.mediakind", ContentType::Int),
    (*b"cmsp", "dmcp.sp", ContentType::Byte),
    (*b"cmsr", "dmcp.mediarevision", ContentType::Int),
    (*b"cmst", "dmcp.status", ContentType::Container),
    (*b"cmsv", "dmcp.sv", ContentType::Byte),
    (*b"cmvo", "dmcp.volume", ContentType::Int),
    (*b"mbcl", "dmap.bag", ContentType::Container),
    (*b"mccr", "dmap.contentcodesresponse", ContentType::Container),
    (*b"mcna", "dmap.contentcodesname", ContentType::String),
    (*b"mcnm", "dmap.contentcodesnumber", ContentType::Int),
    (*b"mcon", "dmap.container", ContentType::Container),
    (*b"mctc", "dmap.containercount", ContentType::Int),
    (*b"mcti", "dmap.containeritemid", ContentType::Int),
    (*b"mcty", "dmap.contentcodestype", ContentType::Short),
    (*b"mdcl", "dmap.dictionary", ContentType::Container),
    (*b"medc", "dmap.editdictionary", ContentType::Container),
    (*b"meds", "dmap.editstatus", ContentType::Int),
    (*b"miid", "dmap.itemid", ContentType::Int),
    (*b"mikd", "dmap.itemkind", ContentType::Byte),
    (*b"mimc", "dmap.itemcount", ContentType::Int),
    (*b"minm", "dmap.itemname", ContentType::String),
    (*b"mlcl", "dmap.listing", ContentType::Container),
    (*b"mlid", "dmap.sessionid", ContentType::Int),
    (*b"mlit", "dmap.listingitem", ContentType::Container),
    (*b"mlit", "dmap.listingitemstring", ContentType::String),
    (*b"mlog", "dmap.loginresponse", ContentType::Container),
    (*b"mpco", "dmap.parentcontainerid", ContentType::Int),
    (*b"mper", "dmap.persistentid", ContentType::Long),
    (*b"mpro", "dmap.protocolversion", ContentType::Version),
    (*b"mrco", "dmap.returnedcount", ContentType::Int),
    (*b"msal", "dmap.supportsautologout", ContentType::Byte),
    (*b"msas", "dmap.authenticationschemes", ContentType::Int),
    (*b"msau", "dmap.authenticationmethod", ContentType::Byte),
    (*b"msbr", "dmap.supportsbrowse", ContentType::Byte),
    (*b"msdc", "dmap.databasescount", ContentType::Int),
    (*b"msed", "dmap.supportsedit", ContentType::Byte),
    (*b"msex", "dmap.supportsextensions", ContentType::Byte),
    (*b"msix", "dmap.supportsindex", ContentType::Byte),
    (*b"mslr", "dmap.loginrequired", ContentType::Byte),
    (*b"msma", "dmap.speakermachineaddress", ContentType::Long),
    (*b"msml", "dmap.speakermachinelist", ContentType::Container),
    (*b"mspi", "dmap.supportspersistentids", ContentType::Byte),
    (*b"msqy", "dmap.supportsquery", ContentType::Byte),
    (*b"msrs", "dmap.supportsresolve", ContentType::Byte),
    (*b"msrv", "dmap.serverinforesponse", ContentType::Container),
    (*b"mstc", "dmap.utctime", ContentType::Date),
    (*b"mstm", "dmap.timeoutinterval", ContentType::Int),
    (*b"msts", "dmap.statusstring", ContentType::String),
    (*b"mstt", "dmap.status", ContentType::Int),
    (*b"msup", "dmap.supportsupdate", ContentType::Byte),
    (*b"mtco", "dmap.specifiedtotalcount", ContentType::Int),
    (*b"mudl", "dmap.deletedidlisting", ContentType::Container),
    (*b"mupd", "dmap.updateresponse", ContentType::Container),
    (*b"musr", "dmap.serverrevision", ContentType::Int),
    (*b"muty", "dmap.updatetype", ContentType::Byte),
];
